//! `application/x-www-form-urlencoded` parsing.

use std::collections::HashMap;

use super::percent::percent_decode;
use super::CodecError;

/// Decoded form fields. A key may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    inner: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value recorded for `key`, in arrival order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Parse a form-encoded string.
///
/// Pairs are separated by `&` or `;` and split on the first `=`. A key with no
/// `=` maps to an empty value and empty segments are skipped. A pair whose key
/// or value fails to decode is dropped; parsing continues and the first such
/// error is returned next to the partial result.
pub fn parse_form_encoded(raw: &str) -> (FormValues, Option<CodecError>) {
    let mut values = FormValues::new();
    let mut first_error = None;

    for segment in raw.split(['&', ';']) {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let decoded = percent_decode(key).and_then(|k| percent_decode(value).map(|v| (k, v)));
        match decoded {
            Ok((key, value)) => values.append(key, value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    (values, first_error)
}
