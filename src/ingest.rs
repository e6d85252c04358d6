//! Structured-record ingestion adapter.
//!
//! Pure data transformation in front of the shipper: rewrite the numeric
//! severity code to its name, strip configured fields, serialize to JSON,
//! and forward the resulting line. No concurrency or failure semantics of
//! its own.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{level::Severity, shipper::Shipper};

/// Adapter accepting structured records on behalf of a [`Shipper`].
pub struct RecordStream {
    shipper: Shipper,
    exclude: Vec<String>,
}

impl RecordStream {
    pub fn new(shipper: Shipper) -> Self {
        Self {
            shipper,
            exclude: Vec::new(),
        }
    }

    /// Fields removed from every record prior to serialization.
    pub fn with_excluded_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Serialize and forward one structured record.
    ///
    /// A numeric `level` field with a known severity code is rewritten to
    /// the severity name; excluded fields are dropped. Records that do not
    /// serialize to a JSON object are forwarded untouched. The only error
    /// is the caller's own type failing to serialize; transport concerns
    /// never surface here.
    pub fn write<T: Serialize>(&self, record: &T) -> Result<(), serde_json::Error> {
        let mut value = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut value {
            rewrite_level(map);
            for field in &self.exclude {
                map.remove(field);
            }
        }
        self.shipper.log(&value.to_string());
        Ok(())
    }

    /// Hand the underlying shipper back, e.g. to close it explicitly.
    pub fn into_inner(self) -> Shipper {
        self.shipper
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("exclude", &self.exclude)
            .finish()
    }
}

fn rewrite_level(map: &mut Map<String, Value>) {
    if let Some(code) = map.get("level").and_then(Value::as_u64)
        && let Some(severity) = Severity::from_code(code)
    {
        map.insert("level".to_owned(), Value::String(severity.as_str().to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rewrite_level_maps_known_codes() {
        let Value::Object(mut map) = json!({"level": 30, "msg": "hi"}) else {
            unreachable!("json! object literal");
        };
        rewrite_level(&mut map);
        assert_eq!(map.get("level"), Some(&json!("info")));
    }

    #[test]
    fn rewrite_level_keeps_unknown_codes() {
        let Value::Object(mut map) = json!({"level": 35}) else {
            unreachable!("json! object literal");
        };
        rewrite_level(&mut map);
        assert_eq!(map.get("level"), Some(&json!(35)));
    }

    #[test]
    fn rewrite_level_ignores_non_numeric_levels() {
        let Value::Object(mut map) = json!({"level": "info"}) else {
            unreachable!("json! object literal");
        };
        rewrite_level(&mut map);
        assert_eq!(map.get("level"), Some(&json!("info")));
    }
}
