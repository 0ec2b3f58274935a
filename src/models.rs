use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Element of GET /projects/<project>/repositories/<repo>/artifacts.
/// Harbor returns more fields (type, size, push_time); only the ones the
/// retention engine reads are modeled, the rest are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub digest: String,
    pub tags: Option<Vec<Tag>>,
}

/// Tag attached to an artifact
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub push_time: DateTime<Utc>,
}
