/// Credential extraction from the `Authorization` header

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

fn credential_with_scheme(headers: &HeaderMap, scheme: &str) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorizationHeader)?;

    match value.strip_prefix(scheme) {
        Some(credential) if !credential.trim().is_empty() => Ok(credential.trim().to_string()),
        _ => Err(AuthError::MalformedAuthorizationHeader),
    }
}

/// `Authorization: Bearer <token>` -> `<token>`
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    credential_with_scheme(headers, "Bearer ")
}

/// `Authorization: ApiKey <key>` -> `<key>`
pub fn get_api_key(headers: &HeaderMap) -> Result<String, AuthError> {
    credential_with_scheme(headers, "ApiKey ").map_err(|e| match e {
        AuthError::MissingToken => AuthError::MissingApiKey,
        _ => AuthError::InvalidApiKey,
    })
}
