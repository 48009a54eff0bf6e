/// Application Error Handling
///
/// Every handler returns `Result<_, AppError>`. Domain errors are grouped into
/// small enums and folded into `AppError`, which knows how to render the
/// `{"error": "..."}` body clients see. Failures are logged through
/// `ErrorContext::record` and by the request logger, both under the request's id.
///
/// Internal failures reach clients as a generic message; the detail only goes
/// to the logs, keyed by a request id.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::logger::RequestId;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooLong(String, usize),
    InvalidFormat(String),
    ChirpTooLong,
    InvalidId(String),
    MalformedBody(String),
    InvalidQuery(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} required", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} bytes)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::ChirpTooLong => write!(f, "Chirp is too long"),
            ValidationError::InvalidId(what) => write!(f, "invalid {} ID", what),
            ValidationError::MalformedBody(msg) => {
                write!(f, "could not decode request body: {}", msg)
            }
            ValidationError::InvalidQuery(param) => write!(f, "invalid query parameter: {}", param),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(what) => write!(f, "{} not found", what),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Session token failures, one variant per distinguishable cause.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    InvalidSignature,
    Expired,
    NotYetValid,
    MalformedSubject,
    Malformed(String),
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Token signature is invalid"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::NotYetValid => write!(f, "Token is not valid yet"),
            TokenError::MalformedSubject => write!(f, "Token subject is not a valid user ID"),
            TokenError::Malformed(msg) => write!(f, "Malformed token: {}", msg),
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken,
    MalformedAuthorizationHeader,
    Token(TokenError),
    RefreshTokenInvalid,
    RefreshTokenRevoked,
    RefreshTokenExpired,
    MissingApiKey,
    InvalidApiKey,
    NotResourceOwner,
    PlatformRestricted,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Incorrect email or password"),
            AuthError::MissingToken => write!(f, "missing Authorization header"),
            AuthError::MalformedAuthorizationHeader => write!(f, "malformed Authorization header"),
            AuthError::Token(e) => write!(f, "{}", e),
            AuthError::RefreshTokenInvalid => write!(f, "Refresh token not found"),
            AuthError::RefreshTokenRevoked => write!(f, "Refresh token has been revoked"),
            AuthError::RefreshTokenExpired => write!(f, "Refresh token has expired"),
            AuthError::MissingApiKey => write!(f, "missing API key"),
            AuthError::InvalidApiKey => write!(f, "invalid API key"),
            AuthError::NotResourceOwner => write!(f, "caller does not own the resource"),
            AuthError::PlatformRestricted => write!(f, "operation not allowed on this platform"),
        }
    }
}

impl StdError for AuthError {}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::Internal(format!("Token signing failed: {}", msg)),
            other => AppError::Auth(AuthError::Token(other)),
        }
    }
}

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record".to_string()))
            }
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    db_err.message().to_string(),
                ))
            }
            e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
                AppError::Database(DatabaseError::ConnectionPool(e.to_string()))
            }
            other => AppError::Database(DatabaseError::QueryExecution(other.to_string())),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Body of every error response.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl AppError {
    /// Message safe to show to the caller.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => "Email already registered".to_string(),
                DatabaseError::NotFound(_) => e.to_string(),
                _ => "Database error occurred".to_string(),
            },
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => e.to_string(),
                AuthError::MissingToken | AuthError::MalformedAuthorizationHeader => {
                    "missing or malformed Authorization header".to_string()
                }
                AuthError::Token(_) => "invalid or expired token".to_string(),
                // Unknown, revoked and expired refresh tokens look the same to clients.
                AuthError::RefreshTokenInvalid
                | AuthError::RefreshTokenRevoked
                | AuthError::RefreshTokenExpired => "unauthorized".to_string(),
                AuthError::MissingApiKey | AuthError::InvalidApiKey => "invalid API key".to_string(),
                AuthError::NotResourceOwner => "forbidden".to_string(),
                AuthError::PlatformRestricted => {
                    "reset is only allowed in the dev environment".to_string()
                }
            },
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.client_message()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::NotResourceOwner | AuthError::PlatformRestricted => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to failure logs.
///
/// The request id is the one `LoggerMiddleware` assigned, so a recorded
/// failure lines up with that request's start and completion events.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: RequestId,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(request_id: RequestId, operation: impl Into<String>) -> Self {
        Self {
            request_id,
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Log a failure with the operation context attached, then hand the error back.
    pub fn record(&self, error: AppError) -> AppError {
        let request_id = self.request_id;
        let operation = self.operation.as_str();
        let user_id = self.user_id.as_deref().unwrap_or("-");

        match &error {
            AppError::Validation(_) | AppError::Auth(_) => {
                tracing::warn!(%request_id, operation, user_id, error = %error, "Operation rejected");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(%request_id, operation, user_id, error = %error, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(%request_id, operation, user_id, error = %error, "Operation target missing");
            }
            _ => {
                tracing::error!(%request_id, operation, user_id, error = %error, "Operation failed");
            }
        }

        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("password".to_string());
        assert_eq!(err.to_string(), "password required");
        assert_eq!(ValidationError::ChirpTooLong.to_string(), "Chirp is too long");
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::InvalidFormat("email".to_string()).into();
        match app_err {
            AppError::Validation(_) => (),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err: AppError = TokenError::Signing("boom".to_string()).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_failures_are_unauthorized() {
        for cause in [
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::NotYetValid,
            TokenError::MalformedSubject,
        ] {
            let err: AppError = cause.into();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.client_message(), "invalid or expired token");
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Auth(AuthError::NotResourceOwner).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database(DatabaseError::NotFound("chirp".to_string())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(DatabaseError::UniqueConstraintViolation("x".to_string()))
                .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(DatabaseError::ConnectionPool("down".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("bcrypt exploded: secret detail".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_refresh_failures_share_one_message() {
        let messages: Vec<String> = [
            AuthError::RefreshTokenInvalid,
            AuthError::RefreshTokenRevoked,
            AuthError::RefreshTokenExpired,
        ]
        .into_iter()
        .map(|e| AppError::Auth(e).client_message())
        .collect();

        assert!(messages.iter().all(|m| m == "unauthorized"));
    }

    #[test]
    fn test_record_returns_the_error_unchanged() {
        let ctx = ErrorContext::new(RequestId::new(), "chirp_deletion").with_user_id("user-1");
        let err = ctx.record(AuthError::NotResourceOwner.into());
        assert!(matches!(err, AppError::Auth(AuthError::NotResourceOwner)));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_error_context_creation() {
        let request_id = RequestId::new();
        let ctx = ErrorContext::new(request_id, "test_operation");
        assert_eq!(ctx.operation, "test_operation");
        assert_eq!(ctx.request_id, request_id);
        assert!(ctx.user_id.is_none());

        let ctx_with_user = ctx.with_user_id("user-123");
        assert_eq!(ctx_with_user.user_id, Some("user-123".to_string()));
    }
}
