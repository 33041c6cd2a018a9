use std::fmt;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the ids handed out by [`RecordId::generate`].
const AUTO_ID_LEN: usize = 20;

/// Identifier of a stored record. Assigned by the store and otherwise opaque.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A random alphanumeric id of the shape Firestore uses for auto-ids.
    pub fn generate() -> Self {
        Self({
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(AUTO_ID_LEN)
                .map(char::from)
                .collect()
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub text: String,
    /// Server-assigned creation time. `None` while the store has not
    /// resolved it yet.
    pub created_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn is_pending(&self) -> bool {
        self.created_at.is_none()
    }
}

/// The part of a record the client supplies. The store fills in the id and
/// the creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub text: String,
}

impl NewRecord {
    /// Returns `None` for text that is empty or only whitespace. The text is
    /// otherwise kept as typed.
    pub fn from_draft(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }
}

/// Names of the stored fields that hold a record's text and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    pub text: String,
    pub created_at: String,
}

impl FieldMapping {
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: created_at.into(),
        }
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::new("message", "timestamp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_eq!(a.as_str().len(), AUTO_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_blank_drafts_are_rejected() {
        assert_eq!(NewRecord::from_draft(""), None);
        assert_eq!(NewRecord::from_draft(" \n\t "), None);
        assert_eq!(
            NewRecord::from_draft("  keep the spaces "),
            Some(NewRecord {
                text: "  keep the spaces ".to_string()
            })
        );
    }
}
