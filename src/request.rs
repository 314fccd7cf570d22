use std::collections::BTreeMap;

use serde::Serialize;

/// Value type for a request keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestValue {
    Str(String),
    StrList(Vec<String>),
}

impl From<&str> for RequestValue {
    fn from(value: &str) -> Self {
        RequestValue::Str(value.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(value: String) -> Self {
        RequestValue::Str(value)
    }
}

impl From<Vec<String>> for RequestValue {
    fn from(value: Vec<String>) -> Self {
        RequestValue::StrList(value)
    }
}

impl From<&[&str]> for RequestValue {
    fn from(value: &[&str]) -> Self {
        RequestValue::StrList(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RequestValue {
    fn from(value: [&str; N]) -> Self {
        RequestValue::StrList(value.into_iter().map(|s| s.to_string()).collect())
    }
}

impl RequestValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestValue::Str(s) => Some(s),
            RequestValue::StrList(_) => None,
        }
    }

    pub fn as_strings(&self) -> Vec<String> {
        match self {
            RequestValue::Str(s) => vec![s.clone()],
            RequestValue::StrList(xs) => xs.clone(),
        }
    }
}

/// CDS request expressed as keyword/value pairs.
///
/// Serializes to the JSON object the retrieve API expects as `inputs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Request {
    inner: BTreeMap<String, RequestValue>,
}

impl Request {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Insert a keyword/value pair (value can be a scalar or list).
    pub fn kw(mut self, key: impl Into<String>, value: impl Into<RequestValue>) -> Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RequestValue>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RequestValue> {
        self.inner.get(key)
    }

    /// Scalar value for `key`, if present and not a list.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(RequestValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_scalars_and_lists() {
        let r = Request::new()
            .kw("format", "netcdf")
            .kw("time", ["00:00", "12:00"]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"format": "netcdf", "time": ["00:00", "12:00"]})
        );
    }

    #[test]
    fn set_overwrites_existing_key() {
        let mut r = Request::new().kw("grid", "1.0/1.0");
        r.set("grid", "0.25/0.25");
        assert_eq!(r.get_str("grid"), Some("0.25/0.25"));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn list_values_have_no_scalar_form() {
        let r = Request::new().kw("variable", vec!["2m_temperature".to_string()]);
        assert_eq!(r.get_str("variable"), None);
        assert_eq!(
            r.get("variable").unwrap().as_strings(),
            vec!["2m_temperature"]
        );
    }
}
