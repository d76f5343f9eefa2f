//! Parameter codec.
//!
//! Turns a typed [`CommandRequest`] into the flat string map Bear expects
//! on its x-callback-url query string. Flags become `yes` / `no`, lists are
//! comma-joined, required text is checked non-empty. Pure, no I/O.

use crate::domain::action::{Action, FieldKind};
use crate::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Token Bear understands as `true`
pub const FLAG_TRUE: &str = "yes";
/// Token Bear understands as `false`
pub const FLAG_FALSE: &str = "no";

/// Raw parameter value before encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::List(v)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(v: &[&str]) -> Self {
        ParamValue::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// One command for Bear: an action plus its raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    action: Action,
    parameters: BTreeMap<String, ParamValue>,
}

impl CommandRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Add the parameter only when a value is present.
    pub fn with_opt<V: Into<ParamValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Build a request from a JSON object of strings, booleans and string
    /// arrays. `null` members are skipped; numbers are taken as text.
    pub fn from_json(action: Action, params: &Value) -> Result<Self, ValidationError> {
        let object = match params {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new(action)),
            _ => return Err(ValidationError::NotAnObject),
        };

        let mut request = Self::new(action);
        for (key, value) in object {
            let param = match value {
                Value::Null => continue,
                Value::Bool(b) => ParamValue::Flag(*b),
                Value::String(s) => ParamValue::Text(s.clone()),
                Value::Number(n) => ParamValue::Text(n.to_string()),
                Value::Array(items) => ParamValue::List(
                    items
                        .iter()
                        .map(|item| {
                            item.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| ValidationError::InvalidType {
                                    action,
                                    field: key.clone(),
                                    expected: "a list of strings",
                                })
                        })
                        .collect::<Result<_, _>>()?,
                ),
                Value::Object(_) => {
                    return Err(ValidationError::InvalidType {
                        action,
                        field: key.clone(),
                        expected: "a string, boolean or list of strings",
                    })
                }
            };
            request.parameters.insert(key.clone(), param);
        }
        Ok(request)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    /// Text value of a parameter, if it is present as text.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.parameters.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }
}

/// Encoded, string-only parameters ready for the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedParameters(BTreeMap<String, String>);

impl EncodedParameters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percent-encoded query string. Spaces are written as `%20` because
    /// Bear does not turn `+` back into a space.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        encode_spaces(serializer.finish())
    }
}

/// Swap form-encoding's `+` for `%20`. A literal `+` is already `%2B` here.
pub(crate) fn encode_spaces(query: String) -> String {
    if query.contains('+') {
        query.replace('+', "%20")
    } else {
        query
    }
}

/// Encode a request against its action's parameter table.
pub fn encode(request: &CommandRequest) -> Result<EncodedParameters, ValidationError> {
    let action = request.action;

    for spec in action.fields() {
        if spec.kind == FieldKind::RequiredText && !request.parameters.contains_key(spec.name) {
            return Err(ValidationError::MissingField {
                action,
                field: spec.name.to_string(),
            });
        }
    }

    let mut encoded = BTreeMap::new();
    for (key, value) in &request.parameters {
        let spec = action
            .field(key)
            .ok_or_else(|| ValidationError::UnknownField {
                action,
                field: key.clone(),
            })?;

        if let Some(text) = encode_field(action, key, spec.kind, value)? {
            encoded.insert(key.clone(), text);
        }
    }

    Ok(EncodedParameters(encoded))
}

fn encode_field(
    action: Action,
    key: &str,
    kind: FieldKind,
    value: &ParamValue,
) -> Result<Option<String>, ValidationError> {
    let invalid_type = |expected| ValidationError::InvalidType {
        action,
        field: key.to_string(),
        expected,
    };

    match (kind, value) {
        (FieldKind::Flag, ParamValue::Flag(b)) => Ok(Some(encode_flag(*b).to_string())),
        (FieldKind::Flag, ParamValue::Text(s)) => match s.as_str() {
            FLAG_TRUE | FLAG_FALSE => Ok(Some(s.clone())),
            _ => Err(ValidationError::InvalidFlag {
                action,
                field: key.to_string(),
                value: s.clone(),
            }),
        },
        (FieldKind::Flag, ParamValue::List(_)) => Err(invalid_type("a boolean or yes/no")),

        (FieldKind::List, ParamValue::List(items)) => {
            let joined = items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(",");
            Ok((!joined.is_empty()).then_some(joined))
        }
        (FieldKind::List, ParamValue::Text(s)) => Ok((!s.is_empty()).then(|| s.clone())),
        (FieldKind::List, ParamValue::Flag(_)) => Err(invalid_type("a list of strings")),

        (FieldKind::Text, ParamValue::Text(s)) => {
            Ok((!s.trim().is_empty()).then(|| s.clone()))
        }
        (FieldKind::RequiredText, ParamValue::Text(s)) => {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyField {
                    action,
                    field: key.to_string(),
                })
            } else {
                Ok(Some(s.clone()))
            }
        }
        (FieldKind::Text | FieldKind::RequiredText, _) => Err(invalid_type("a string")),
    }
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        FLAG_TRUE
    } else {
        FLAG_FALSE
    }
}
