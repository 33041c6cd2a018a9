use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::record::{FieldMapping, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

/// An ordered query over a whole collection. No limit is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub collection: String,
    pub order_by: String,
    pub direction: Direction,
}

impl Query {
    /// The feed query: every record of `collection`, newest first.
    pub fn newest_first(collection: impl Into<String>, fields: &FieldMapping) -> Self {
        Self {
            collection: collection.into(),
            order_by: fields.created_at.clone(),
            direction: Direction::Descending,
        }
    }

    /// Orders records by creation time, then by id. Pending timestamps sort
    /// below every resolved one, so they come last in a descending query.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id));
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }

    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::record::RecordId;

    fn record(id: &str, secs: Option<i64>) -> Record {
        Record {
            id: RecordId::new(id),
            text: id.to_string(),
            created_at: secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }
    }

    #[test]
    fn test_newest_first() {
        let query = Query::newest_first("messages", &FieldMapping::default());
        assert_eq!(query.order_by, "timestamp");

        let mut records = vec![
            record("a", Some(10)),
            record("pending", None),
            record("c", Some(30)),
            record("b", Some(20)),
        ];
        query.sort(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a", "pending"]);
    }

    #[test]
    fn test_direction_wire_format() {
        assert_eq!(
            serde_json::to_string(&Direction::Descending).unwrap(),
            "\"DESCENDING\""
        );
    }
}
