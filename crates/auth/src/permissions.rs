//! Client-side permission rules.
//!
//! These only decide which actions to offer; the API remains the authority
//! and may still reject a request.
//!
//! - No IO
//! - No panics
//! - Missing identity or authorship never grants anything

use serde::Serialize;

use quire_core::{Article, Comment};

use crate::Session;

/// A resource owned by a user, identified by username.
pub trait Authored {
    fn author_name(&self) -> Option<&str>;
}

impl Authored for Article {
    fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }
}

impl Authored for Comment {
    fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }
}

/// Why an ownership check came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Anonymous,
    /// Staff, superuser, or a privileged group member.
    Elevated,
    Author,
    NotAuthor,
}

impl Decision {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Elevated | Self::Author)
    }
}

/// Staff/superuser flag or membership in a privileged group.
pub fn is_admin_like(session: &Session) -> bool {
    match session.identity() {
        Some(identity) => {
            identity.is_staff
                || identity.is_superuser
                || identity.groups.iter().any(|g| g.is_privileged())
        }
        None => false,
    }
}

/// Ownership-or-elevation check shared by every edit/delete rule.
pub fn decide(session: &Session, resource: &impl Authored) -> Decision {
    if !session.is_authenticated() {
        return Decision::Anonymous;
    }
    if is_admin_like(session) {
        return Decision::Elevated;
    }

    let author = resource.author_name().map(str::trim).filter(|a| !a.is_empty());
    match (session.username(), author) {
        (Some(me), Some(author)) if me == author => Decision::Author,
        _ => Decision::NotAuthor,
    }
}

pub fn can_edit_article(session: &Session, article: &Article) -> bool {
    decide(session, article).is_granted()
}

/// Same boundary as [`can_edit_article`].
pub fn can_delete_article(session: &Session, article: &Article) -> bool {
    decide(session, article).is_granted()
}

pub fn can_manage_comment(session: &Session, comment: &Comment) -> bool {
    decide(session, comment).is_granted()
}
