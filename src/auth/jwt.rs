/// Session Token Issuance and Validation
///
/// HS256-signed JWTs. Validation checks signature, `exp` and `nbf` with no
/// leeway, and the fixed issuer, then recovers the user ID from `sub`.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TOKEN_ISSUER};
use crate::error::TokenError;

/// Lifetime of every session token
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Issue a signed session token for `user_id` valid for `ttl`.
///
/// # Errors
/// Returns `TokenError::Signing` if encoding fails
pub fn make_jwt(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let claims = Claims::new(user_id, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Issue a session token with the standard lifetime
pub fn generate_access_token(user_id: Uuid, secret: &str) -> Result<String, TokenError> {
    make_jwt(user_id, secret, Duration::seconds(ACCESS_TOKEN_TTL_SECONDS))
}

/// Validate a session token and return the user ID it was issued for
///
/// # Errors
/// One `TokenError` variant per cause: bad signature, expired, not yet
/// valid, malformed subject, or anything else wrong with the token.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(e.to_string()),
    })?;

    data.claims.user_id()
}
