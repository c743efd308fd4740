//! Shared-secret authentication.
//!
//! Mutating routes require an `x-api-key` header matching one of the
//! configured keys. With no keys configured every request is allowed.

/// Request header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Configured set of accepted API keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    keys: Vec<String>,
}

impl ApiKeys {
    /// Builds the key set, dropping blank entries.
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys }
    }

    /// Parses a comma separated list such as `API_KEYS=a,b`.
    #[must_use]
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether callers must present a key at all.
    #[must_use]
    pub fn is_required(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Checks a presented key. A missing key counts as the empty string.
    #[must_use]
    pub fn allows(&self, presented: Option<&str>) -> bool {
        if !self.is_required() {
            return true;
        }
        let presented = presented.unwrap_or_default();
        self.keys.iter().any(|k| k == presented)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
