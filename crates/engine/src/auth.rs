//! Caller authentication.
//!
//! The [`Authenticator`] is the only trusted source of "who is calling". It
//! is a leaf dependency: it never reads accounts or the ledger.

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, access_tokens, users, util::parse_uuid};

/// A verified caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub email: String,
}

/// Turns a bearer token into a verified identity.
///
/// Implementations must fail with [`EngineError::Unauthorized`] when the
/// token does not resolve to an active identity and must have no side
/// effects.
#[async_trait]
pub trait Authenticator: fmt::Debug + Send + Sync {
    async fn verify(&self, token: &str) -> ResultEngine<UserIdentity>;
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; the token must be a single
/// non-empty word.
pub fn bearer_token(header: Option<&str>) -> ResultEngine<&str> {
    let header =
        header.ok_or_else(|| EngineError::Unauthorized("missing bearer token".to_string()))?;
    let malformed = || EngineError::Unauthorized("malformed authorization header".to_string());

    let (scheme, token) = header.trim().split_once(' ').ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }
    let token = token.trim();
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    Ok(token)
}

/// Authenticator backed by the identity provider's tables in the store.
#[derive(Clone, Debug)]
pub struct StoreAuthenticator {
    database: DatabaseConnection,
}

impl StoreAuthenticator {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Authenticator for StoreAuthenticator {
    async fn verify(&self, token: &str) -> ResultEngine<UserIdentity> {
        let invalid = || EngineError::Unauthorized("invalid token".to_string());

        let grant = access_tokens::Entity::find_by_id(token.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if grant.revoked {
            return Err(EngineError::Unauthorized("token revoked".to_string()));
        }
        if grant.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(EngineError::Unauthorized("token expired".to_string()));
        }

        let user = users::Entity::find_by_id(grant.user_id)
            .one(&self.database)
            .await?
            .filter(|user| user.active)
            .ok_or_else(invalid)?;

        Ok(UserIdentity {
            user_id: parse_uuid(&user.id, "user")?,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extracts_token() {
        assert_eq!(bearer_token(Some("Bearer abc123")).unwrap(), "abc123");
        assert_eq!(bearer_token(Some("bearer  abc123 ")).unwrap(), "abc123");
    }

    #[test]
    fn bearer_token_rejects_missing_header() {
        assert_eq!(
            bearer_token(None),
            Err(EngineError::Unauthorized("missing bearer token".to_string()))
        );
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_blank_tokens() {
        for header in ["Basic abc", "Bearer", "Bearer   ", "abc123", "Bearer a b", ""] {
            assert!(
                matches!(bearer_token(Some(header)), Err(EngineError::Unauthorized(_))),
                "{header:?}"
            );
        }
    }
}
