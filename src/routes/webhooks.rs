/// Payment Provider Webhooks
///
/// Polka notifies us when a user pays; only `user.upgraded` changes anything.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::PolkaApiKey;
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::logger::RequestId;

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct PolkaWebhookRequest {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: PolkaWebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolkaWebhookData {
    #[serde(default)]
    pub user_id: String,
}

/// POST /api/polka/webhooks
///
/// # Errors
/// - 401: missing or wrong API key
/// - 404: user ID does not parse or names no user
pub async fn polka_webhook(
    _api_key: PolkaApiKey,
    form: web::Json<PolkaWebhookRequest>,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "polka_webhook");

    if form.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&form.data.user_id)
        .map_err(|_| context.record(DatabaseError::NotFound("user".to_string()).into()))?;

    let upgraded = sqlx::query(
        r#"
        UPDATE users
        SET is_chirpy_red = TRUE, updated_at = $1
        WHERE id = $2
        "#,
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| context.record(e.into()))?
    .rows_affected();

    if upgraded == 0 {
        return Err(context.record(DatabaseError::NotFound("user".to_string()).into()));
    }

    tracing::info!(request_id = %context.request_id, user_id = %user_id, "User upgraded to Chirpy Red");
    Ok(HttpResponse::NoContent().finish())
}
