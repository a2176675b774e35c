use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Group membership name as reported by the API.
///
/// Groups are opaque strings; only a fixed set of them elevates a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(Cow<'static, str>);

impl Group {
    pub const ADMIN: Group = Group(Cow::Borrowed("admin"));
    pub const WRITER: Group = Group(Cow::Borrowed("writer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether membership alone grants editorial rights over any content.
    pub fn is_privileged(&self) -> bool {
        self == &Self::ADMIN || self == &Self::WRITER
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Group {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}
