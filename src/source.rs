//! Record files written by the content generators
//!
//! A file holds either a JSON array of records or a single record object. Records are
//! loosely structured: every field is optional and unknown fields are ignored, so
//! fields are kept as raw JSON values and interpreted by the rules in [`crate::post`].

use crate::{post::Skip, Error};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Many(Vec<Value>),
    One(Map<String, Value>),
}

impl Document {
    pub fn load(path: &Path) -> Result<Document, Error> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// the entries of this document in file order
    pub fn records(self) -> Box<dyn Iterator<Item = Result<SourceRecord, Skip>>> {
        match self {
            Self::One(map) => Box::new(std::iter::once(Ok(SourceRecord::from_map(map)))),
            Self::Many(values) => Box::new(values.into_iter().map(SourceRecord::try_from_value)),
        }
    }
}

#[derive(Debug, Default, PartialEq, Clone, Deserialize)]
pub struct SourceRecord {
    pub id: Option<Value>,
    pub content: Option<Value>,
    pub topic: Option<Value>,
    pub platform: Option<Value>,
    pub created_at: Option<Value>,
    pub generated_at: Option<Value>,
    pub status: Option<Value>,
    pub posted: Option<Value>,
}

impl SourceRecord {
    /// pick the known fields out of a JSON object; a `null` counts as absent
    pub fn from_map(mut map: Map<String, Value>) -> SourceRecord {
        let mut take = |key: &str| map.remove(key).filter(|value| !value.is_null());
        SourceRecord {
            id: take("id"),
            content: take("content"),
            topic: take("topic"),
            platform: take("platform"),
            created_at: take("created_at"),
            generated_at: take("generated_at"),
            status: take("status"),
            posted: take("posted"),
        }
    }

    pub fn try_from_value(value: Value) -> Result<SourceRecord, Skip> {
        match value {
            Value::Object(map) => Ok(SourceRecord::from_map(map)),
            _ => Err(Skip::NotAnObject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(contents: &str) -> Result<Document, Error> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        Document::load(file.path())
    }

    #[test]
    fn loads_sequence() {
        let doc = load_str(r#"[{"content": "a"}, {"content": "b", "extra": [1, 2]}]"#).unwrap();
        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].as_ref().unwrap().content,
            Some(Value::String("b".into()))
        );
    }

    #[test]
    fn loads_single_record() {
        let doc = load_str(r#"{"content": "solo", "platform": "twitter"}"#).unwrap();
        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].as_ref().unwrap().platform,
            Some(Value::String("twitter".into()))
        );
    }

    #[test]
    fn non_objects_in_sequence_are_skipped() {
        let doc = load_str(r#"[{"content": "ok"}, "stray", 3, null, ["content"]]"#).unwrap();
        let skips = doc
            .records()
            .filter(|record| *record == Err(Skip::NotAnObject))
            .count();
        assert_eq!(skips, 4);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(load_str(r#"[{"content": "#), Err(Error::Parse(_))));
    }

    #[test]
    fn scalar_document_is_a_parse_error() {
        assert!(matches!(load_str("42"), Err(Error::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Document::load(&dir.path().join("gone.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn nulls_count_as_absent() {
        let record = SourceRecord::try_from_value(json!({
            "content": "c",
            "topic": null,
            "id": null,
        }))
        .unwrap();
        assert_eq!(record.topic, None);
        assert_eq!(record.id, None);
    }
}
