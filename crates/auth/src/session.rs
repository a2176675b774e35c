//! In-memory session model.

use serde::Serialize;

use quire_core::{Me, UserId};

use crate::Group;

/// Identity and authorization attributes of an authenticated user.
///
/// Every attribute may be missing depending on how the identity was resolved
/// (profile endpoint vs. token claims); absent attributes never grant rights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Option<UserId>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<Group>,
}

impl Identity {
    /// Username, if present and non-blank.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn in_group(&self, group: &Group) -> bool {
        self.groups.contains(group)
    }

    /// Name to show in the UI: display name, then full name, then username.
    pub fn label(&self) -> Option<String> {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(name.to_string());
        }
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !full.is_empty() {
            return Some(full.to_string());
        }
        self.username().map(str::to_string)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

impl From<Me> for Identity {
    fn from(me: Me) -> Self {
        let profile = me.profile.unwrap_or_default();
        Self {
            id: Some(me.id),
            username: non_empty(me.username),
            email: me.email.and_then(non_empty),
            first_name: me.first_name,
            last_name: me.last_name,
            display_name: non_empty(profile.display_name),
            avatar_url: non_empty(profile.avatar_url),
            bio: non_empty(profile.bio),
            is_staff: me.is_staff,
            is_superuser: me.is_superuser,
            groups: me.groups.into_iter().map(Group::from).collect(),
        }
    }
}

/// Authentication state of the current user.
///
/// A session is either anonymous or authenticated, never both; it is replaced
/// as a whole rather than edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self::Authenticated(identity)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.identity().and_then(Identity::username)
    }
}

impl From<Me> for Session {
    fn from(me: Me) -> Self {
        Self::Authenticated(Identity::from(me))
    }
}
