use serde_json::Value;

use crate::client::{Fetched, Transport};

/// Upper bound on pages walked in one call, in case the server never
/// stops advertising a next page.
pub const MAX_PAGES: u32 = 1000;

/// Collated result of walking a paginated endpoint to completion.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every page's records, in page order and within-page order
    Records(Vec<Value>),
    /// Nothing retrieved at all (propagated unchanged from the transport)
    Empty,
    /// Retries exhausted on a page fetch
    Failed,
}

/// Walk a `page=`-cursored endpoint from the seed URL to the last page,
/// collating all records. The seed must carry `page=1`.
pub async fn fetch_all(transport: &Transport, seed_url: &str) -> FetchOutcome {
    let mut records: Vec<Value> = Vec::new();
    let mut page: u32 = 1;
    let mut url = seed_url.to_string();

    loop {
        let (body, has_next) = match transport.get(&url).await {
            Fetched::Payload { body, has_next } => (body, has_next),
            Fetched::Empty => {
                if page == 1 {
                    return FetchOutcome::Empty;
                }
                eprintln!(
                    "[ERROR] page {} of {} returned nothing; keeping {} records from earlier pages",
                    page,
                    seed_url,
                    records.len()
                );
                return FetchOutcome::Records(records);
            }
            Fetched::Failed(_) => return FetchOutcome::Failed,
        };

        match body {
            Value::Array(items) => records.extend(items),
            _ => {
                eprintln!("[ERROR] expected a JSON array from {}; stopping", url);
                return FetchOutcome::Records(records);
            }
        }

        if !has_next {
            return FetchOutcome::Records(records);
        }
        if page >= MAX_PAGES {
            eprintln!(
                "[ERROR] stopping after {} pages of {}; server still advertises more",
                MAX_PAGES, seed_url
            );
            return FetchOutcome::Records(records);
        }

        page += 1;
        url = advance_cursor(&url, page);
    }
}

/// Rewrite the URL's cursor token from `page=<page-1>` to `page=<page>`.
/// Literal substring replacement; a seed that does not start at `page=1`
/// leaves this a no-op.
fn advance_cursor(url: &str, page: u32) -> String {
    url.replace(&format!("page={}", page - 1), &format!("page={}", page))
}
