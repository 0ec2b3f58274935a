use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::client::Transport;
use crate::error::AppError;
use crate::models::{Artifact, Tag};
use crate::paginate::{self, FetchOutcome};

pub const DEFAULT_THRESHOLD_DAYS: i64 = 30;

/// Parse the operator-supplied retention threshold. Blank or omitted
/// falls back to the 30-day default; anything non-numeric or negative is
/// rejected before any network call is made.
pub fn parse_threshold(raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(DEFAULT_THRESHOLD_DAYS);
    }
    match raw.parse::<i64>() {
        Ok(days) if days >= 0 => Ok(days),
        _ => Err(AppError::InvalidThreshold),
    }
}

/// Age-based tag retention: every tag at or past the threshold is
/// deleted, one DELETE per tag, each action reported in order.
pub struct RetentionPolicy {
    threshold_days: i64,
}

impl RetentionPolicy {
    pub fn new(threshold_days: i64) -> Self {
        Self { threshold_days }
    }

    /// Fetch the full artifact list behind `artifacts_url` and delete
    /// every stale tag on it. Returns the line-per-action audit report.
    pub async fn delete_stale_tags(
        &self,
        transport: &Transport,
        artifacts_url: &str,
    ) -> Vec<String> {
        let records = match paginate::fetch_all(transport, artifacts_url).await {
            FetchOutcome::Records(records) => records,
            FetchOutcome::Empty => Vec::new(),
            FetchOutcome::Failed => return vec!["GET REQUEST FAILED".to_string()],
        };

        let artifacts = parse_artifacts(records);
        if artifacts.is_empty() {
            return vec![format!(
                "no artifacts found older than {} days",
                self.threshold_days
            )];
        }

        let today = Utc::now().date_naive();
        let mut report = Vec::new();

        for artifact in &artifacts {
            let tags = artifact.tags.as_deref().unwrap_or(&[]);
            if tags.is_empty() {
                report.push(format!(
                    "No tags found for artifact with digest: {}.",
                    artifact.digest
                ));
                continue;
            }
            for tag in tags {
                if self.is_stale(tag, today) {
                    report.push(format!("Deleting tag: {}", tag.name));
                    let url = delete_url(artifacts_url, &artifact.digest, &tag.name);
                    let result = transport.delete(&url).await;
                    report.push(result.to_string());
                } else {
                    report.push(format!(
                        "No tags found older than {} days",
                        self.threshold_days
                    ));
                }
            }
        }

        report
    }

    /// Whole calendar days between the push date and today. A tag pushed
    /// exactly `threshold_days` ago is already stale.
    fn is_stale(&self, tag: &Tag, today: NaiveDate) -> bool {
        let age_days = (today - tag.push_time.date_naive()).num_days();
        age_days >= self.threshold_days
    }
}

fn parse_artifacts(records: Vec<Value>) -> Vec<Artifact> {
    let mut artifacts = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<Artifact>(record) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => eprintln!("[ERROR] skipping malformed artifact record: {}", e),
        }
    }
    artifacts
}

/// `<artifacts endpoint without query>/<digest>/tags/<tag>`; the only
/// character the digest needs escaped in a path segment is the colon.
fn delete_url(artifacts_url: &str, digest: &str, tag: &str) -> String {
    let base = artifacts_url.split('?').next().unwrap_or(artifacts_url);
    format!("{}/{}/tags/{}", base, digest.replace(':', "%3A"), tag)
}
