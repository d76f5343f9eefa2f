//! Callback payloads returned by Bear.
//!
//! Bear reports results as query parameters on the `x-success` / `x-error`
//! URL. Every value is optimistically JSON-decoded (Bear ships note lists
//! and tag lists as JSON text) and kept as a plain string when it is not
//! valid JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Decoded query parameters of one callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackPayload(Map<String, Value>);

/// Note entry from the `notes` list of search-like actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

/// Tag entry from the `tags` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub name: String,
}

/// Decode one raw callback value.
pub fn decode_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl CallbackPayload {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a payload from a raw (still percent-encoded) query string.
    pub fn from_query(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), decode_value(&value)))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Value rendered as text: strings verbatim, `null` as absent, anything
    /// else as JSON. Undoes the optimistic decoding, so a note titled `2024`
    /// reads back as `"2024"`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn identifier(&self) -> Option<String> {
        self.text("identifier")
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    /// Note body returned by `open-note`.
    pub fn note_text(&self) -> Option<String> {
        self.text("note")
    }

    /// `errorCode` of an error callback.
    pub fn error_code(&self) -> Option<String> {
        self.text("errorCode")
    }

    /// `errorMessage` of an error callback.
    pub fn error_message(&self) -> Option<String> {
        self.text("errorMessage")
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key("errorCode") || self.0.contains_key("errorMessage")
    }

    /// Notes listed by `search`, `open-tag`, `todo`, `today` and `untagged`.
    ///
    /// Returns an empty list when Bear sent no `notes` parameter (it omits
    /// it when no API token was supplied).
    pub fn notes(&self) -> Result<Vec<NoteSummary>, serde_json::Error> {
        self.list("notes")
    }

    /// Tags listed by `tags`.
    pub fn tags(&self) -> Result<Vec<TagSummary>, serde_json::Error> {
        self.list("tags")
    }

    fn list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, serde_json::Error> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            // Still a string after decoding: Bear sent something that was not JSON
            Some(Value::String(raw)) => serde_json::from_str(raw),
            Some(value) => Vec::<T>::deserialize(value),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for CallbackPayload {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Map<String, Value>> for CallbackPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<CallbackPayload> for Value {
    fn from(payload: CallbackPayload) -> Self {
        Value::Object(payload.0)
    }
}
