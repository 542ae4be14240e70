//! # Response Formatting
//!
//! The shaped result of one query and its JSON form.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::Record;

/// Key carrying the filtered count in a `$count=true` response
pub const COUNT_KEY: &str = "@odata.count";

/// Key carrying the records in a `$count=true` response
pub const VALUE_KEY: &str = "value";

/// Output of the query shaper.
///
/// Serializes as a bare JSON array, or as
/// `{"@odata.count": n, "value": [...]}` when a count was requested.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shaped {
    /// Full or partial records, in result order
    pub records: Vec<Record>,
    /// Number of records matching the filter, before `$skip`/`$top`
    pub count: Option<usize>,
}

impl Shaped {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl Serialize for Shaped {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.count {
            Some(count) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(COUNT_KEY, &count)?;
                map.serialize_entry(VALUE_KEY, &self.records)?;
                map.end()
            }
            None => self.records.serialize(serializer),
        }
    }
}
