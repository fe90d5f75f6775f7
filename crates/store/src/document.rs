//! Collection entry envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a store collection: user fields plus the store-assigned
/// id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Assigned by the store at write time; `None` while the write is
    /// still in flight (not yet acknowledged)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub fields: Value,
}

impl Document {
    /// Flatten into a single JSON object with `id` and `createdAt`
    /// injected next to the user fields. This is the shape consumers
    /// deserialize typed records from.
    pub fn merged(&self) -> Value {
        let mut obj = match &self.fields {
            Value::Object(m) => m.clone(),
            _ => Map::new(),
        };
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(ts) = self.created_at {
            obj.insert(
                "createdAt".to_string(),
                Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            );
        }
        Value::Object(obj)
    }
}
