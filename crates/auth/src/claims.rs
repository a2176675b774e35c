//! Access-token claims, for resolving identity without a profile endpoint.
//!
//! Tokens are decoded **without** signature verification: the client only
//! reads what the server already put there, and the server re-checks every
//! request anyway.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use quire_core::UserId;

use crate::{Group, Identity};

/// Claims carried by an access token.
///
/// Only `exp` and `user_id` are always present; the rest are optional custom
/// claims and default to "no rights" when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub token_type: Option<String>,

    /// Expiration, seconds since the epoch.
    pub exp: i64,

    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(deserialize_with = "user_id_from_int_or_string")]
    pub user_id: UserId,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub is_staff: bool,

    #[serde(default)]
    pub is_superuser: bool,

    #[serde(default)]
    pub groups: Vec<String>,
}

fn user_id_from_int_or_string<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(id) => Ok(UserId::new(id)),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    /// Identity derived from claims; profile fields stay empty.
    pub fn into_identity(self) -> Identity {
        Identity {
            id: Some(self.user_id),
            username: self.username.filter(|u| !u.trim().is_empty()),
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            groups: self.groups.into_iter().map(Group::from).collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenDecodeError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token is not an access token (token_type = {0})")]
    WrongType(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Tolerated difference between the issuing server's clock and ours.
pub const CLOCK_SKEW_LEEWAY_SECS: i64 = 60;

/// Decode access-token claims without checking the signature or expiry.
pub fn decode_unverified(token: &str) -> Result<AccessClaims, TokenDecodeError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .map_err(|e| TokenDecodeError::Malformed(e.to_string()))?;

    let claims = data.claims;
    match claims.token_type.as_deref() {
        None | Some("access") => Ok(claims),
        Some(other) => Err(TokenDecodeError::WrongType(other.to_string())),
    }
}

/// Deterministically validate the claims' time window against `now`.
///
/// A token issued slightly "in the future" is accepted within
/// [`CLOCK_SKEW_LEEWAY_SECS`]; expiry is checked strictly.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let expires_at = claims
        .expires_at()
        .ok_or(TokenValidationError::InvalidTimeWindow)?;

    if let Some(issued_at) = claims.issued_at() {
        if expires_at <= issued_at {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        if now + chrono::Duration::seconds(CLOCK_SKEW_LEEWAY_SECS) < issued_at {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    if now >= expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
