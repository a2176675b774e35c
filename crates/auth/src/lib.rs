//! `quire-auth`: pure session and permission boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows what
//! a session is and what it may do, never how it was obtained.

pub mod claims;
pub mod gate;
pub mod groups;
pub mod permissions;
pub mod session;

pub use claims::{
    AccessClaims, CLOCK_SKEW_LEEWAY_SECS, TokenDecodeError, TokenValidationError, decode_unverified,
    validate_claims,
};
pub use gate::{Gate, gate};
pub use groups::Group;
pub use permissions::{
    Authored, Decision, can_delete_article, can_edit_article, can_manage_comment, decide,
    is_admin_like,
};
pub use session::{Identity, Session};
