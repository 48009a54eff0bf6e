/// Request extractors for authenticated handlers
///
/// Handlers that need a caller identity take `AuthenticatedUser` as an
/// argument; handlers that consume a refresh token take `BearerToken`;
/// webhook handlers take `PolkaApiKey`. Extraction failures short-circuit
/// into `AppError` responses.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::headers::{get_api_key, get_bearer_token};
use crate::auth::jwt::validate_jwt;
use crate::configuration::{JwtSettings, PolkaSettings};
use crate::error::{AppError, AuthError};

/// Raw bearer credential from the `Authorization` header
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            get_bearer_token(req.headers())
                .map(BearerToken)
                .map_err(AppError::Auth),
        )
    }
}

/// Caller identity recovered from a valid session token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let jwt_config = req
        .app_data::<web::Data<JwtSettings>>()
        .ok_or_else(|| AppError::Internal("JWT settings are not registered".to_string()))?;

    let token = get_bearer_token(req.headers())?;
    let user_id = validate_jwt(&token, &jwt_config.secret)?;

    tracing::debug!(user_id = %user_id, "Session token validated");
    Ok(AuthenticatedUser { user_id })
}

/// Proof that the request carried the configured payment provider key
#[derive(Debug, Clone, Copy)]
pub struct PolkaApiKey;

impl FromRequest for PolkaApiKey {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(check_api_key(req))
    }
}

fn check_api_key(req: &HttpRequest) -> Result<PolkaApiKey, AppError> {
    let polka = req
        .app_data::<web::Data<PolkaSettings>>()
        .ok_or_else(|| AppError::Internal("Polka settings are not registered".to_string()))?;

    let key = get_api_key(req.headers())?;
    if key != polka.api_key {
        tracing::warn!("Webhook called with an unknown API key");
        return Err(AuthError::InvalidApiKey.into());
    }
    Ok(PolkaApiKey)
}
