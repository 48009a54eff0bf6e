/// User Routes
///
/// Registration and profile update.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, AuthenticatedUser};
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::models::User;
use crate::validators::{is_valid_email, is_valid_password};

/// Body of `POST /api/users` and `PUT /api/users`
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user; never carries the password hash
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: empty password, invalid email, or password over 72 bytes
/// - 409: email already registered
/// - 500: hashing or database failure
pub async fn create_user(
    form: web::Json<UserRequest>,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "user_registration");

    let password = is_valid_password(&form.password)?;
    let email = is_valid_email(&form.email)?;
    let hashed_password = hash_password(password)?;

    let user = insert_user(pool.get_ref(), &email, &hashed_password)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Replace the caller's email and password.
///
/// # Errors
/// - 400: empty password or invalid email
/// - 401: missing or invalid session token
/// - 404: the token's user no longer exists
/// - 409: email taken by another user
pub async fn update_user(
    caller: AuthenticatedUser,
    form: web::Json<UserRequest>,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "user_update").with_user_id(caller.user_id);

    let password = is_valid_password(&form.password)?;
    let email = is_valid_email(&form.email)?;
    let hashed_password = hash_password(password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = $1, hashed_password = $2, updated_at = $3
        WHERE id = $4
        RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
        "#,
    )
    .bind(&email)
    .bind(&hashed_password)
    .bind(Utc::now())
    .bind(caller.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| context.record(e.into()))?
    .ok_or_else(|| context.record(DatabaseError::NotFound("user".to_string()).into()))?;

    tracing::info!(request_id = %context.request_id, user_id = %user.id, "User updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

async fn insert_user(pool: &PgPool, email: &str, hashed_password: &str) -> Result<User, AppError> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, created_at, updated_at, email, hashed_password, is_chirpy_red)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(now)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub(crate) async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, created_at, updated_at, email, hashed_password, is_chirpy_red
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: UserRequest = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert!(req.password.is_empty());
    }

    #[test]
    fn test_response_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: "walt@breakingbad.com".to_string(),
            hashed_password: "$2b$12$secret".to_string(),
            is_chirpy_red: false,
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["email"], "walt@breakingbad.com");
        assert_eq!(json["is_chirpy_red"], false);
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("created_at").is_some());
    }
}
