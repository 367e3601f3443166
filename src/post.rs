//! The canonical post record stored in `generated_content`, and the rules which
//! derive each of its fields from a loosely-structured [`SourceRecord`].
//!
//! Every derivation is a pure function of the record (plus the file name, sequence
//! number, or clock reading it needs), so each rule can be checked on its own.

use crate::source::SourceRecord;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub const DEFAULT_TOPIC: &str = "No topic";
pub const DEFAULT_PLATFORM: Platform = Platform::LinkedIn;
pub const PUBLISHED_STATUS: &str = "published";

/// `isoformat()`-style local timestamp used when a record carries no time of its own
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Platform {
    Twitter,
    Instagram,
    LinkedIn,
}

impl Platform {
    /// order in which platform names are looked for in a file name; first match wins
    pub const INFERENCE_ORDER: [Platform; 3] =
        [Platform::Twitter, Platform::Instagram, Platform::LinkedIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
        }
    }

    /// infer a platform from substrings of a file name, case-insensitively
    pub fn from_file_name(file_name: &str) -> Option<Platform> {
        let file_name = file_name.to_lowercase();
        Self::INFERENCE_ORDER
            .iter()
            .copied()
            .find(|platform| file_name.contains(platform.as_str()))
    }
}

/// Why a source entry was not migrated.
///
/// None of these are errors: the entry is left out and the run carries on.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Skip {
    /// `content` is missing, null, or whitespace
    BlankContent,
    /// `content` is present but is not text
    NonTextContent,
    /// the entry in the sequence is not a JSON object
    NotAnObject,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::BlankContent => write!(f, "blank content"),
            Skip::NonTextContent => write!(f, "content is not text"),
            Skip::NotAnObject => write!(f, "entry is not a record"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Post {
    pub platform: String,
    pub content: String,
    pub topic: String,
    pub post_id: String,
    pub generated_at: String,
    pub posted: bool,
}

/// loose truthiness: null, false, zero, and empty strings or collections are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// render a field as stored text; strings are taken verbatim, anything else as JSON
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy_text(value: &Option<Value>) -> Option<String> {
    value.as_ref().filter(|value| is_truthy(value)).map(as_text)
}

/// the record's content, if it is eligible for migration
///
/// Content is stored untrimmed; trimming only decides whether it is blank.
pub fn eligible_content(record: &SourceRecord) -> Result<&str, Skip> {
    match &record.content {
        None => Err(Skip::BlankContent),
        Some(Value::String(s)) if s.trim().is_empty() => Err(Skip::BlankContent),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(Skip::NonTextContent),
    }
}

/// explicit `platform` field, else a platform named in the file name, else the default
pub fn derive_platform(record: &SourceRecord, file_name: &str) -> String {
    truthy_text(&record.platform).unwrap_or_else(|| {
        Platform::from_file_name(file_name)
            .unwrap_or(DEFAULT_PLATFORM)
            .as_str()
            .to_string()
    })
}

/// the record's own `id`, else `<platform>_<sequence>`
pub fn derive_post_id(record: &SourceRecord, platform: &str, sequence: u64) -> String {
    truthy_text(&record.id).unwrap_or_else(|| format!("{}_{}", platform, sequence))
}

pub fn derive_topic(record: &SourceRecord) -> String {
    record
        .topic
        .as_ref()
        .map(as_text)
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string())
}

/// `created_at`, else `generated_at`, else `now`
pub fn derive_generated_at(record: &SourceRecord, now: DateTime<Local>) -> String {
    record
        .created_at
        .as_ref()
        .or_else(|| record.generated_at.as_ref())
        .map(as_text)
        .unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string())
}

pub fn derive_posted(record: &SourceRecord) -> bool {
    let published = matches!(&record.status, Some(Value::String(status)) if status == PUBLISHED_STATUS);
    published || record.posted.as_ref().map(is_truthy).unwrap_or(false)
}

impl Post {
    /// Normalize a source record found in the file `file_name`.
    ///
    /// `sequence` is only used when the record has no `id` of its own.
    pub fn from_record(
        record: &SourceRecord,
        file_name: &str,
        sequence: u64,
        now: DateTime<Local>,
    ) -> Result<Post, Skip> {
        let content = eligible_content(record)?.to_string();
        let platform = derive_platform(record, file_name);
        let post_id = derive_post_id(record, &platform, sequence);
        Ok(Post {
            content,
            topic: derive_topic(record),
            post_id,
            generated_at: derive_generated_at(record, now),
            posted: derive_posted(record),
            platform,
        })
    }
}
