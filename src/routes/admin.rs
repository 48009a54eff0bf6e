/// Admin Routes
///
/// Hit counter page and the dev-only reset.

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::configuration::ApplicationSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::logger::RequestId;
use crate::metrics::ApiMetrics;

fn metrics_page(hits: u64) -> String {
    format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits
    )
}

/// GET /admin/metrics
pub async fn metrics(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(metrics_page(metrics.hits()))
}

/// POST /admin/reset
///
/// Deletes every user (chirps and refresh tokens go with them) and zeroes the
/// hit counter.
///
/// # Errors
/// - 403: platform is not "dev"
/// - 500: database failure
pub async fn reset(
    application: web::Data<ApplicationSettings>,
    pool: web::Data<PgPool>,
    metrics: web::Data<ApiMetrics>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "admin_reset");

    if !application.is_dev() {
        return Err(context.record(AuthError::PlatformRestricted.into()));
    }

    let deleted = sqlx::query("DELETE FROM users")
        .execute(pool.get_ref())
        .await
        .map_err(|e| context.record(e.into()))?
        .rows_affected();
    metrics.reset();

    tracing::info!(
        request_id = %context.request_id,
        deleted_users = deleted,
        "Database and hit counter reset"
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_page_contains_count() {
        let page = metrics_page(42);
        assert!(page.contains("<h1>Welcome, Chirpy Admin</h1>"));
        assert!(page.contains("Chirpy has been visited 42 times!"));
    }
}
