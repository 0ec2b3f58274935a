use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::paginate::FetchOutcome;

/// Print a read operation's collated result as JSON
pub fn print_records(outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Records(records) => {
            let count = records.len();
            println!("{}", serde_json::to_string_pretty(&Value::Array(records))?);
            println!(
                "\n{} {}.",
                count.to_string().bold(),
                if count == 1 { "record" } else { "records" }
            );
        }
        FetchOutcome::Empty => println!("{}", "{}".dimmed()),
        FetchOutcome::Failed => println!("{}", "GET REQUEST FAILED".red().bold()),
    }
    Ok(())
}

/// Print the retention engine's line-per-action report
pub fn print_report(report: &[String]) {
    for line in report {
        if line.starts_with("Deleting tag: ") {
            println!("{}", line.red());
        } else if line.ends_with("REQUEST FAILED") {
            println!("{}", line.red().bold());
        } else if line.starts_with("No tags found") || line.starts_with("no artifacts found") {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }

    let deletions = report
        .iter()
        .filter(|l| l.starts_with("Deleting tag: "))
        .count();
    println!("\n{}", "═".repeat(60));
    println!(
        "{} {} deletion{} issued",
        "SUMMARY:".bold(),
        deletions,
        if deletions == 1 { "" } else { "s" }
    );
}
