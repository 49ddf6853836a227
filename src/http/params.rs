//! Ordered header and query-parameter collections.
//!
//! # Design Decisions
//! - Both collections are plain ordered vectors: order of first insertion is
//!   part of the wire format (headers) and of the rendered URL (queries)
//! - Key matching is case-sensitive; callers own normalisation
//! - Percent-encoding keeps only RFC 3986 unreserved characters literal

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except `A-Z a-z 0-9 - . _ ~` is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ordered `(name, value)` header list with upsert semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields(Vec<(String, String)>);

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the first entry named `key` in place, or append.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert(&mut self.0, key.into(), value.into());
    }

    /// First value stored under `key` (case-sensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value whose name matches `key` ignoring ASCII case.
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_ignore_case(&self, key: &str) -> bool {
        self.get_ignore_case(key).is_some()
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
}

impl From<Vec<(String, String)>> for HeaderFields {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }
}

/// Ordered query parameters.
///
/// Bulk construction keeps duplicates; [`QueryParams::set`] is an upsert and
/// [`QueryParams::insert_if_absent`] keeps the first occurrence of a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the first entry named `key` in place, or append.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert(&mut self.0, key.into(), value.into());
    }

    /// Append unconditionally, duplicates included.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Append only when `key` has not been seen yet. Returns whether it was stored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.0.push((key, value.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
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

    /// `k1=v1&k2=v2` with every key and value percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn upsert(fields: &mut Vec<(String, String)>, key: String, value: String) {
    match fields.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => fields.push((key, value)),
    }
}

/// Percent-encode one query key or value.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

/// Decode `%XX` escapes; invalid UTF-8 is replaced lossily.
pub fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Decode a form-style component: `+` means space, then `%XX` escapes.
pub fn decode_form_component(raw: &str) -> String {
    decode_component(&raw.replace('+', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_upsert_keeps_position() {
        let mut headers = HeaderFields::new();
        headers.set("Accept", "*/*");
        headers.set("User-Agent", "a");
        headers.set("Accept", "application/json");

        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("Accept", "application/json"), ("User-Agent", "a")]);
    }

    #[test]
    fn header_keys_are_case_sensitive() {
        let mut headers = HeaderFields::new();
        headers.set("content-type", "a");
        headers.set("Content-Type", "b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("content-type"), Some("a"));
        assert_eq!(headers.get_ignore_case("CONTENT-TYPE"), Some("a"));
    }

    #[test]
    fn query_insert_if_absent_keeps_first() {
        let mut params = QueryParams::new();
        assert!(params.insert_if_absent("id", "1"));
        assert!(!params.insert_if_absent("id", "2"));
        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn query_push_keeps_duplicates() {
        let mut params = QueryParams::new();
        params.push("tag", "a");
        params.push("tag", "b");
        assert_eq!(params.to_query_string(), "tag=a&tag=b");
    }

    #[test]
    fn encoding_escapes_reserved_characters() {
        assert_eq!(encode_component("q[id]"), "q%5Bid%5D");
        assert_eq!(encode_component("a b/c~d.e_f-g"), "a%20b%2Fc~d.e_f-g");
        assert_eq!(encode_component("ü"), "%C3%BC");
    }

    #[test]
    fn form_decoding_handles_plus_and_escapes() {
        assert_eq!(decode_form_component("Foo+Bar%21"), "Foo Bar!");
        assert_eq!(decode_component("a+b%2Fc"), "a+b/c");
    }
}
