//! Attribute storage with normalized keys.

use chrono::{DateTime, Utc};
use heck::ToSnakeCase;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Normalize an attribute key to its canonical snake_case form.
///
/// `signerEid`, `signer_eid` and `SignerEid` all map to `signer_eid`.
pub fn normalize_key(key: &str) -> String {
    key.to_snake_case()
}

/// Normalize every object key in a JSON value, recursively.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (normalize_key(&k), normalize_value(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

/// The attribute mapping backing a resource.
///
/// Keys are normalized on the way in, whatever casing the API used, and
/// lookups normalize the requested key the same way. Reads of attributes the
/// library does not model return `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    map: Map<String, Value>,
}

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object, normalizing keys recursively.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let map = map
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), normalize_value(v)))
            .collect();
        Self { map }
    }

    /// Build from a JSON value. Non-object values produce an empty set.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    /// Get an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.map.get(key) {
            Some(value) => Some(value),
            None => self.map.get(&normalize_key(key)),
        }
    }

    /// Set an attribute. The key is normalized; the value is stored as given.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.map.insert(normalize_key(key), value.into());
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(&normalize_key(key))
    }

    /// Check whether an attribute is present, even if null.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get a string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get a boolean attribute.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Get an integer attribute.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Get a floating point attribute.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Get an array attribute.
    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Get an object attribute.
    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Get an RFC 3339 timestamp attribute.
    pub fn get_datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get_str(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Attributes whose keys are not in `known`.
    pub fn unknown(&self, known: &[&str]) -> Map<String, Value> {
        self.map
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Iterate over the normalized keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Iterate over key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Consume and return the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }

    /// Copy the attributes into a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.map.clone())
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl From<Value> for Attributes {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_are_normalized_recursively() {
        let attrs = Attributes::from_value(json!({
            "eid": "p1",
            "isTest": true,
            "detailURL": "https://app.useanvil.com/packets/p1",
            "documentGroup": {"eid": "dg1", "signerEid": "s1"},
            "signers": [{"routingOrder": 1}]
        }));

        assert_eq!(attrs.get_bool("is_test"), Some(true));
        assert_eq!(attrs.get_str("detail_url"), Some("https://app.useanvil.com/packets/p1"));
        assert_eq!(attrs.get_object("document_group").unwrap()["signer_eid"], "s1");
        assert_eq!(attrs.get_array("signers").unwrap()[0]["routing_order"], 1);
    }

    #[test]
    fn test_lookup_accepts_either_casing() {
        let attrs = Attributes::from_value(json!({"createdAt": "2024-01-01T00:00:00Z"}));
        assert!(attrs.contains("createdAt"));
        assert!(attrs.contains("created_at"));
        assert_eq!(
            attrs.get_datetime("createdAt").unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_unknown_attribute_is_none() {
        let attrs = Attributes::from_value(json!({"eid": "p1"}));
        assert!(attrs.get("somethingNew").is_none());
        assert!(attrs.get_str("eid").is_some());
        assert!(attrs.get_i64("eid").is_none());
    }

    #[test]
    fn test_set_stores_value_verbatim() {
        let mut attrs = Attributes::new();
        attrs.set("customField", json!({"innerKey": 1}));
        assert_eq!(attrs.get("custom_field").unwrap()["innerKey"], 1);
        assert_eq!(attrs.remove("customField"), Some(json!({"innerKey": 1})));
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_unknown_bag() {
        let attrs = Attributes::from_value(json!({"eid": "p1", "name": "x", "newThing": 2}));
        let extra = attrs.unknown(&["eid", "name"]);
        assert_eq!(extra.len(), 1);
        assert_eq!(extra["new_thing"], 2);
    }

    #[test]
    fn test_serde() {
        let attrs: Attributes = serde_json::from_value(json!({"signerEid": "s1"})).unwrap();
        assert_eq!(serde_json::to_value(&attrs).unwrap(), json!({"signer_eid": "s1"}));
    }
}
