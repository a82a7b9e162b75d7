//! Multi-valued request parameters.

use url::form_urlencoded;

use crate::request::PathParams;

/// Decoded form, query and path values for one request.
///
/// Keys may repeat; [`Params::get`] returns the first value for a key and
/// [`Params::get_all`] returns every value in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(String, String)>,
}

impl Params {
    /// Creates empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` payload.
    pub fn from_urlencoded(input: &[u8]) -> Self {
        Self {
            values: form_urlencoded::parse(input).into_owned().collect(),
        }
    }

    /// Appends a value.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.push((key.into(), value.into()));
    }

    /// Appends every value of `other`, after the existing ones.
    pub fn extend(&mut self, other: &Self) {
        self.values.extend(other.values.iter().cloned());
    }

    /// Appends path parameters.
    pub fn extend_path(&mut self, path: &PathParams) {
        for (k, v) in path.iter() {
            self.append(k, v);
        }
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns all values for `key`.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Parses the first value for `key`.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    /// Iterates over all key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_value() {
        let params = Params::from_urlencoded(b"tag=a&tag=b&page=2");
        assert_eq!(params.get("tag"), Some("a"));
        assert_eq!(params.get_all("tag"), ["a", "b"]);
        assert_eq!(params.parse::<u32>("page"), Some(2));
        assert!(params.get_all("missing").is_empty());
    }

    #[test]
    fn test_decoding() {
        let params = Params::from_urlencoded(b"name=John+Doe&city=New%20York&empty=");
        assert_eq!(params.get("name"), Some("John Doe"));
        assert_eq!(params.get("city"), Some("New York"));
        assert_eq!(params.get("empty"), Some(""));
    }

    #[test]
    fn test_extend_keeps_first_value() {
        let mut params = Params::new();
        let mut path = PathParams::new();
        path.insert("id", "7");
        params.extend_path(&path);
        params.extend(&Params::from_urlencoded(b"id=8"));

        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get_all("id"), ["7", "8"]);
        assert_eq!(params.len(), 2);
    }
}
