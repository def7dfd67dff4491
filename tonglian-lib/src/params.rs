//! Flat key/value parameter sets exchanged with the gateway.
//!
//! Keys are kept in byte order, so iteration order is already the order the
//! canonicalizer needs. Values are JSON scalars; nested values must be
//! flattened to a single string before they are added (see
//! [`merge_channel_extra`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GatewayError, Result};

/// Name of the signature field.
pub const SIGN_FIELD: &str = "sign";

/// Ordered-by-key mapping from field name to scalar value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, Value>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a parameter set from a JSON object.
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self(object.into_iter().collect())
    }

    /// Build a parameter set from any JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self::from_object(object)),
            other => Err(GatewayError::Serialization(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            ))),
        }
    }

    /// Insert a value, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an optional string, writing an empty string when absent.
    pub(crate) fn insert_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        self.insert(key, value.unwrap_or_default())
    }

    /// Get the raw value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get the value for a key as it participates in signing.
    ///
    /// Returns `None` for absent, null or empty values.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(render_value)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns true if the key is present (even with an empty value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries, including empty ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the entries that take part in signing, rendered as strings.
    pub fn signable(&self) -> impl Iterator<Item = (&str, String)> {
        self.0
            .iter()
            .filter_map(|(k, v)| render_value(v).map(|rendered| (k.as_str(), rendered)))
    }

    /// Merge another set into this one; `other` wins on collisions.
    pub fn extend(&mut self, other: ParameterSet) {
        self.0.extend(other.0);
    }

    /// Split off the `sign` field, returning the remaining set and the signature.
    pub fn split_signature(mut self) -> (Self, Option<String>) {
        let sign = self.remove(SIGN_FIELD).as_ref().and_then(render_value);
        (self, sign)
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }

    /// Render as URL query parameters.
    ///
    /// Empty values are skipped; a value is percent-encoded only when it
    /// contains `+`.
    pub fn to_url_params(&self) -> String {
        self.signable()
            .map(|(k, v)| {
                if v.contains('+') {
                    let encoded: String = url::form_urlencoded::byte_serialize(v.as_bytes()).collect();
                    format!("{k}={encoded}")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl FromIterator<(String, Value)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render a value the way it appears in a canonical string.
///
/// Null and empty strings render as `None`. Containers are never walked; they
/// render as their compact JSON text.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

/// Merge client-level channel extras with call-level ones and flatten to a string.
///
/// - `call == None`: the client defaults are used as-is.
/// - `call == Some(empty)`: no extras are sent.
/// - otherwise the call values are laid over the client defaults.
///
/// An empty result is rendered as the empty string.
pub fn merge_channel_extra(
    defaults: &Map<String, Value>,
    call: Option<&Map<String, Value>>,
) -> Result<String> {
    let merged = match call {
        None => defaults.clone(),
        Some(call) if call.is_empty() => Map::new(),
        Some(call) => {
            let mut merged = defaults.clone();
            merged.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }
    };

    if merged.is_empty() {
        Ok(String::new())
    } else {
        Ok(serde_json::to_string(&merged)?)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signable_skips_null_and_empty() {
        let params = ParameterSet::new()
            .with("b", "2")
            .with("a", 1)
            .with("empty", "")
            .with("nothing", Value::Null);

        let rendered: Vec<_> = params.signable().collect();
        assert_eq!(
            rendered,
            vec![("a", "1".to_string()), ("b", "2".to_string())]
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_split_signature() {
        let params = ParameterSet::new().with("mchNo", "M1").with("sign", "ABC");
        let (rest, sign) = params.split_signature();
        assert_eq!(sign.as_deref(), Some("ABC"));
        assert!(!rest.contains_key("sign"));
        assert_eq!(rest.get_str("mchNo").as_deref(), Some("M1"));
    }

    #[test]
    fn test_channel_extra_inherits_defaults() {
        let defaults = json!({"cusid": "C1", "orgid": "O1"});
        let defaults = defaults.as_object().unwrap();

        let merged = merge_channel_extra(defaults, None).unwrap();
        assert_eq!(merged, r#"{"cusid":"C1","orgid":"O1"}"#);
    }

    #[test]
    fn test_channel_extra_call_values_win() {
        let defaults = json!({"cusid": "C1", "orgid": "O1"});
        let call = json!({"cusid": "C2", "openid": "用户"});

        let merged =
            merge_channel_extra(defaults.as_object().unwrap(), call.as_object()).unwrap();
        let decoded: Value = serde_json::from_str(&merged).unwrap();
        assert_eq!(decoded, json!({"cusid": "C2", "orgid": "O1", "openid": "用户"}));
        // non-ASCII stays unescaped
        assert!(merged.contains("用户"));
    }

    #[test]
    fn test_channel_extra_explicitly_empty() {
        let defaults = json!({"cusid": "C1"});
        let empty = Map::new();
        let merged = merge_channel_extra(defaults.as_object().unwrap(), Some(&empty)).unwrap();
        assert_eq!(merged, "");
        assert_eq!(merge_channel_extra(&Map::new(), None).unwrap(), "");
    }

    #[test]
    fn test_url_params_encode_plus_only() {
        let params = ParameterSet::new()
            .with("sign", "ab+c/d=")
            .with("body", "a b")
            .with("skip", "");
        assert_eq!(params.to_url_params(), "body=a b&sign=ab%2Bc%2Fd%3D");
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = ParameterSet::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }
}
