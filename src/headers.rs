use reqwest::header::{HeaderName, HeaderValue};
use smol_str::SmolStr;

/// Header entries supplied by the caller, in insertion order.
///
/// Entries are kept as given and only filtered when the request is built:
/// an entry is applied when its value is a string and both halves are legal
/// HTTP header syntax. Everything else is skipped without an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    // `None` marks a value that was not a string.
    entries: Vec<(SmolStr, Option<SmolStr>)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> &mut Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    /// Records an entry whose value was not a string. It is never applied.
    pub fn insert_non_string(&mut self, name: impl Into<SmolStr>) -> &mut Self {
        self.entries.push((name.into(), None));
        self
    }

    /// Builds headers from a JSON object. Non-object input yields no headers;
    /// members whose value is not a JSON string are recorded as non-string.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut headers = Self::new();
        if let Some(object) = value.as_object() {
            for (name, value) in object {
                match value.as_str() {
                    Some(value) => headers.insert(name.as_str(), value),
                    None => headers.insert_non_string(name.as_str()),
                };
            }
        }
        headers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries that will actually be set on the request.
    pub fn validated(&self) -> Vec<(SmolStr, SmolStr)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let Some(value) = value else {
                tracing::debug!(header = %name, "skipping header with non-string value");
                continue;
            };
            if HeaderName::from_bytes(name.as_bytes()).is_err()
                || HeaderValue::from_str(value).is_err()
            {
                tracing::debug!(header = %name, "skipping header with invalid syntax");
                continue;
            }
            pairs.push((name.clone(), value.clone()));
        }
        pairs
    }
}

impl<K, V> FromIterator<(K, V)> for RequestHeaders
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
