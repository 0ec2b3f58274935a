mod cli;
mod client;
mod error;
mod models;
mod output;
mod paginate;
mod retention;

use std::process;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command, ListProjectsArgs, RepoArgs};
use client::{Credentials, Transport};
use output::{print_records, print_report};
use retention::RetentionPolicy;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let base_url = cli.api_url.trim_end_matches('/').to_string();
    let transport = Transport::new(
        Credentials {
            username: cli.username.clone(),
            password: cli.password.clone(),
        },
        cli.verbose,
    );

    match &cli.command {
        Command::ListProjects(args) => {
            let url = projects_url(&base_url, args);
            print_records(paginate::fetch_all(&transport, &url).await)?;
        }
        Command::AllRepos(page) => {
            let url = seed_url(&base_url, "/repositories", page.page_size);
            print_records(paginate::fetch_all(&transport, &url).await)?;
        }
        Command::ProjectRepos(args) => {
            let url = seed_url(
                &base_url,
                &format!("/projects/{}/repositories", args.project),
                args.page.page_size,
            );
            print_records(paginate::fetch_all(&transport, &url).await)?;
        }
        Command::Artifacts(args) => {
            let url = artifacts_url(&base_url, args);
            print_records(paginate::fetch_all(&transport, &url).await)?;
        }
        Command::Delete(args) => {
            // validated before any network call is made
            let threshold = retention::parse_threshold(args.days.as_deref())?;
            let url = artifacts_url(&base_url, &args.target);
            let report = RetentionPolicy::new(threshold)
                .delete_stale_tags(&transport, &url)
                .await;
            print_report(&report);
        }
    }

    Ok(())
}

/// Seed URL with the cursor at page 1, as the paginator requires.
fn seed_url(base: &str, resource: &str, page_size: u32) -> String {
    format!("{}{}?page=1&page_size={}", base, resource, page_size)
}

fn projects_url(base: &str, args: &ListProjectsArgs) -> String {
    let mut url = seed_url(base, "/projects", args.page.page_size);
    if let Some(name) = &args.name {
        url.push_str(&format!("&name={}", name));
    }
    if let Some(owner) = &args.owner {
        url.push_str(&format!("&owner={}", owner));
    }
    if let Some(public) = args.public {
        url.push_str(&format!("&public={}", public));
    }
    if let Some(detail) = args.with_detail {
        url.push_str(&format!("&with_detail={}", detail));
    }
    url
}

fn artifacts_url(base: &str, args: &RepoArgs) -> String {
    seed_url(
        base,
        &format!(
            "/projects/{}/repositories/{}/artifacts",
            args.project, args.repo
        ),
        args.page.page_size,
    )
}
