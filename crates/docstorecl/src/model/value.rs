//! Firestore's typed JSON representation of documents.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{FieldMapping, Record, RecordId};

/// A single typed field value, e.g. `{"stringValue": "hi"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// Firestore sends 64-bit integers as strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampValue(ts) => Some(*ts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

/// A stored document as returned by the REST API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in `/<collection>/<id>`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Reads a record out of the document. A text field that is missing or
    /// not a string reads as empty; a timestamp that is missing or not a
    /// timestamp reads as pending.
    pub fn to_record(&self, fields: &FieldMapping) -> Record {
        let text = self.fields.get(&fields.text).and_then(Value::as_str);
        if text.is_none() {
            log::debug!("document {} has no string field {:?}", self.name, fields.text);
        }

        Record {
            id: RecordId::new(self.id()),
            text: text.unwrap_or_default().to_string(),
            created_at: self
                .fields
                .get(&fields.created_at)
                .and_then(Value::as_timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    const DOCUMENT: &str = r#"{
        "name": "projects/advice/databases/(default)/documents/messages/Yf3kq0x1",
        "fields": {
            "message": { "stringValue": "more coffee" },
            "timestamp": { "timestampValue": "2024-11-05T09:41:07.512Z" },
            "likes": { "integerValue": "3" }
        },
        "createTime": "2024-11-05T09:41:07.512Z",
        "updateTime": "2024-11-05T09:41:07.512Z"
    }"#;

    #[test]
    fn test_document_to_record() {
        let doc: Document = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(doc.id(), "Yf3kq0x1");

        let record = doc.to_record(&FieldMapping::default());
        assert_eq!(record.id.as_str(), "Yf3kq0x1");
        assert_eq!(record.text, "more coffee");

        let ts = record.created_at.expect("timestamp should be resolved");
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 11);
        assert_eq!(ts.hour(), 9);
        assert_eq!(ts.minute(), 41);
    }

    #[test]
    fn test_other_field_mapping() {
        let doc: Document = serde_json::from_str(DOCUMENT).unwrap();
        let record = doc.to_record(&FieldMapping::new("text", "createdAt"));
        assert_eq!(record.text, "");
        assert!(record.is_pending());
    }

    #[test]
    fn test_null_timestamp_is_pending() {
        let doc: Document = serde_json::from_str(
            r#"{
                "name": "projects/p/databases/(default)/documents/messages/x",
                "fields": {
                    "message": { "stringValue": "hi" },
                    "timestamp": { "nullValue": null }
                }
            }"#,
        )
        .unwrap();
        assert!(doc.to_record(&FieldMapping::default()).is_pending());
    }

    #[test]
    fn test_value_wire_format() {
        let json = serde_json::to_value(Value::StringValue("hi".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "stringValue": "hi" }));

        let json = serde_json::to_value(Value::NullValue(())).unwrap();
        assert_eq!(json, serde_json::json!({ "nullValue": null }));
    }
}
