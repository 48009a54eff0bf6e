/// Authentication Routes
///
/// Login, session token refresh, and refresh token revocation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{
    generate_access_token, generate_refresh_token, revoke_refresh_token, save_refresh_token,
    validate_refresh_token, verify_password, BearerToken,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::logger::RequestId;
use crate::routes::users::{get_user_by_email, UserResponse};

/// Body of `POST /api/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// User plus freshly issued credentials
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Body returned by `POST /api/refresh`
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password (same message for both)
/// - 500: signing or database failure
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "user_login");

    let user = get_user_by_email(pool.get_ref(), form.email.trim())
        .await
        .map_err(|e| context.record(e))?
        .ok_or_else(|| context.record(AuthError::InvalidCredentials.into()))?;

    verify_password(&form.password, &user.hashed_password).map_err(|e| context.record(e))?;

    let token = generate_access_token(user.id, &jwt_config.secret).map_err(|e| context.record(e.into()))?;
    let refresh_token = generate_refresh_token();
    save_refresh_token(
        pool.get_ref(),
        user.id,
        &refresh_token,
        jwt_config.refresh_token_expiry,
    )
    .await
    .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: user.into(),
        token,
        refresh_token,
    }))
}

/// POST /api/refresh
///
/// Exchange the refresh token in `Authorization: Bearer` for a new session
/// token. The refresh token itself is not rotated.
///
/// # Errors
/// - 401: missing, unknown, or revoked refresh token
pub async fn refresh(
    bearer: BearerToken,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "token_refresh");

    let user_id = validate_refresh_token(pool.get_ref(), &bearer.0)
        .await
        .map_err(|e| context.record(e))?;
    let token = generate_access_token(user_id, &jwt_config.secret).map_err(|e| context.record(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Session token refreshed"
    );

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: missing Authorization header
/// - 500: database failure
pub async fn revoke(
    bearer: BearerToken,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "token_revoke");

    revoke_refresh_token(pool.get_ref(), &bearer.0)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, "Refresh token revoked");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_login_response_is_flat() {
        let now = Utc::now();
        let response = LoginResponse {
            user: UserResponse {
                id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
                email: "walt@breakingbad.com".to_string(),
                is_chirpy_red: true,
            },
            token: "jwt".to_string(),
            refresh_token: "refresh".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "walt@breakingbad.com");
        assert_eq!(json["is_chirpy_red"], true);
        assert_eq!(json["token"], "jwt");
        assert_eq!(json["refresh_token"], "refresh");
        assert!(json.get("user").is_none());
    }
}
