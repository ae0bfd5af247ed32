use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::null_as_empty;

/// One hit returned by a record-search endpoint (`{id, text}`).
///
/// Ids are opaque: numbers and strings are both accepted and kept as their
/// string form, so `7` and `"7"` refer to the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl LookupItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: normalize_id(&id.into()),
            text: text.into(),
        }
    }
}

/// Response envelope of a record-search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<LookupItem>,
}

impl SuggestionResponse {
    /// Results without an id cannot be selected and are dropped.
    pub fn into_items(self) -> Vec<LookupItem> {
        self.results
            .into_iter()
            .filter(|item| !item.id.is_empty())
            .collect()
    }
}

/// Query sent to a record-search endpoint.
///
/// Field order is the order of parameters on the wire: `q`, `limit`, `page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionQuery {
    pub q: String,
    pub limit: u32,
    pub page: u32,
}

impl SuggestionQuery {
    pub fn first_page(text: &str, limit: u32) -> Self {
        Self {
            q: text.trim().to_string(),
            limit,
            page: 1,
        }
    }
}

/// String form used for id comparisons everywhere in the UI.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_string()
}

/// Converts any JSON scalar id into its normalized string form.
pub fn opaque_id(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_id(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => normalize_id(&other.to_string()),
    }
}

pub fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(opaque_id(&value))
}
