//! Header snapshots for audit entries.

use std::fmt;

use http::{HeaderMap, HeaderValue};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A value that may or may not have a stable string form.
pub trait HeaderText {
    fn header_text(&self) -> Option<String>;
}

impl HeaderText for str {
    fn header_text(&self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl HeaderText for String {
    fn header_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Any value that is valid UTF-8 has a string form.
impl HeaderText for HeaderValue {
    fn header_text(&self) -> Option<String> {
        std::str::from_utf8(self.as_bytes()).ok().map(str::to_owned)
    }
}

impl<T: HeaderText> HeaderText for Option<T> {
    fn header_text(&self) -> Option<String> {
        self.as_ref().and_then(HeaderText::header_text)
    }
}

impl<T: HeaderText + ?Sized> HeaderText for &T {
    fn header_text(&self) -> Option<String> {
        (**self).header_text()
    }
}

/// Flattened, ordered view of a header collection: one string per name.
///
/// Names keep the case they arrived with and are never folded, so `X-A` and
/// `x-a` are two entries. Values without a string form are left out
/// entirely. Serializes to indented JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSnapshot {
    entries: Vec<(String, String)>,
}

impl HeaderSnapshot {
    /// Builds a snapshot from `(name, value)` pairs in iteration order.
    ///
    /// Pairs whose names are byte-identical are merged into the first entry
    /// with that name, values joined by `,`.
    ///
    /// ```rust
    /// use wiretap::audit::HeaderSnapshot;
    ///
    /// let snapshot = HeaderSnapshot::from_pairs([
    ///     ("X-A", Some("1")),
    ///     ("x-a", Some("2")),
    ///     ("X-B", None),
    /// ]);
    /// assert_eq!(snapshot.get("X-A"), Some("1"));
    /// assert_eq!(snapshot.get("x-a"), Some("2"));
    /// assert_eq!(snapshot.get("X-B"), None);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: HeaderText,
    {
        let mut snapshot = Self::default();
        for (name, value) in pairs {
            if let Some(text) = value.header_text() {
                snapshot.push(name.into(), text);
            }
        }
        snapshot
    }

    /// Builds a snapshot from an [`http::HeaderMap`].
    ///
    /// Multi-valued headers are joined with `,`. A header with any value that
    /// is not valid UTF-8 is dropped as a whole.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut snapshot = Self::default();
        for name in headers.keys() {
            let values: Option<Vec<String>> = headers
                .get_all(name)
                .iter()
                .map(HeaderText::header_text)
                .collect();
            if let Some(values) = values {
                snapshot.push(name.as_str().to_owned(), values.join(","));
            }
        }
        snapshot
    }

    fn push(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, joined)) => {
                joined.push(',');
                joined.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indented JSON object, entries in snapshot order.
    pub fn to_json(&self) -> String {
        // A map of strings to strings always serializes.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{}"))
    }
}

impl Serialize for HeaderSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for HeaderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
