use serde::Serialize;

use crate::Session;

/// Outcome of guarding a page that requires an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Session not yet decided; show a loading state, do not redirect.
    Pending,
    RedirectToLogin,
    Allow,
}

pub fn gate(session: &Session, ready: bool) -> Gate {
    if !ready {
        Gate::Pending
    } else if session.is_authenticated() {
        Gate::Allow
    } else {
        Gate::RedirectToLogin
    }
}
