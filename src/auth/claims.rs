/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by a session token. Nothing else is
/// embedded: the subject is enough to identify the caller.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Issuer stamped into and required on every session token
pub const TOKEN_ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims valid from now until `now + ttl`.
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl.num_seconds(),
        }
    }

    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::MalformedSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::seconds(3600));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::seconds(60));

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::seconds(60));
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(TokenError::MalformedSubject));
    }

    #[test]
    fn test_negative_ttl_puts_exp_in_the_past() {
        let claims = Claims::new(Uuid::new_v4(), Duration::seconds(-10));
        assert!(claims.exp < claims.iat);
    }
}
