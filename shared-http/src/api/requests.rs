use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameters for a request, kept sorted by name so the serialized
/// form is stable and usable as part of a cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` onto these params; keys in `other` win.
    pub fn merge(&mut self, other: QueryParams) {
        self.0.extend(other.0);
    }

    pub fn merged(&self, other: QueryParams) -> QueryParams {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Stable string form used in cache keys.
    pub fn serialize(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Flatten into URL query pairs. Nulls are dropped and arrays repeat the key.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match value {
                Value::Null => {}
                Value::Array(values) => {
                    for v in values {
                        if let Some(s) = scalar_to_string(v) {
                            pairs.push((name.clone(), s));
                        }
                    }
                }
                other => {
                    if let Some(s) = scalar_to_string(other) {
                        pairs.push((name.clone(), s));
                    }
                }
            }
        }
        pairs
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl From<Value> for QueryParams {
    /// Objects become params; any other value yields empty params.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map.into_iter().collect()),
            _ => Self::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_is_order_independent() {
        let a = QueryParams::new().with("size", 20).with("page", 0);
        let b = QueryParams::new().with("page", 0).with("size", 20);
        assert_eq!(a.serialize(), b.serialize());
        assert_eq!(a.serialize(), r#"{"page":0,"size":20}"#);
    }

    #[test]
    fn test_merge_overrides() {
        let base = QueryParams::from(json!({"page": 0, "region": "north"}));
        let merged = base.merged(QueryParams::new().with("page", 3));
        assert_eq!(merged.get("page"), Some(&json!(3)));
        assert_eq!(merged.get("region"), Some(&json!("north")));
    }

    #[test]
    fn test_to_pairs() {
        let params = QueryParams::from(json!({
            "page": 1,
            "status": null,
            "types": ["monument", "site"],
            "q": "castle"
        }));
        assert_eq!(
            params.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("q".to_string(), "castle".to_string()),
                ("types".to_string(), "monument".to_string()),
                ("types".to_string(), "site".to_string()),
            ]
        );
    }
}
