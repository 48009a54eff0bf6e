/// Chirp Routes
///
/// Create, list, fetch, and delete chirps. Creation and deletion need a
/// session token; reads are public.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::content_filter::{clean_body, within_length_limit};
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::logger::RequestId;
use crate::models::Chirp;

/// Body of `POST /api/chirps`
#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

/// Query string of `GET /api/chirps`
#[derive(Debug, Default, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortOrder {
    Asc,
    Desc,
}

impl ListChirpsQuery {
    fn author(&self) -> Result<Option<Uuid>, ValidationError> {
        self.author_id
            .as_deref()
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidQuery("author_id".to_string()))
            })
            .transpose()
    }

    fn order(&self) -> Result<SortOrder, ValidationError> {
        match self.sort.as_deref() {
            None | Some("asc") => Ok(SortOrder::Asc),
            Some("desc") => Ok(SortOrder::Desc),
            Some(_) => Err(ValidationError::InvalidQuery("sort".to_string())),
        }
    }
}

/// POST /api/chirps
///
/// # Errors
/// - 400: body longer than 140 characters ("Chirp is too long")
/// - 401: missing or invalid session token
/// - 500: database failure
pub async fn create_chirp(
    caller: AuthenticatedUser,
    form: web::Json<CreateChirpRequest>,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "chirp_creation").with_user_id(caller.user_id);

    if !within_length_limit(&form.body) {
        return Err(ValidationError::ChirpTooLong.into());
    }
    let body = clean_body(&form.body);

    let now = Utc::now();
    let chirp = sqlx::query_as::<_, Chirp>(
        r#"
        INSERT INTO chirps (id, created_at, updated_at, body, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, created_at, updated_at, body, user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(now)
    .bind(&body)
    .bind(caller.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| context.record(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %caller.user_id,
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(ChirpResponse::from(chirp)))
}

/// GET /api/chirps
///
/// Optional `author_id` filter and `sort=asc|desc` by creation time.
pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let author = query.author()?;
    let sql = match query.order()? {
        SortOrder::Asc => {
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at ASC
            "#
        }
        SortOrder::Desc => {
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#
        }
    };

    let chirps = sqlx::query_as::<_, Chirp>(sql)
        .bind(author)
        .fetch_all(pool.get_ref())
        .await?;

    let response: Vec<ChirpResponse> = chirps.into_iter().map(ChirpResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/chirps/{chirp_id}
///
/// An ID that does not parse is reported the same way as a missing chirp.
pub async fn get_chirp(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| DatabaseError::NotFound("chirp".to_string()))?;

    let chirp = fetch_chirp(pool.get_ref(), chirp_id).await?;
    Ok(HttpResponse::Ok().json(ChirpResponse::from(chirp)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 400: chirp ID does not parse
/// - 401: missing or invalid session token
/// - 403: caller does not own the chirp
/// - 404: no such chirp
pub async fn delete_chirp(
    caller: AuthenticatedUser,
    path: web::Path<String>,
    pool: web::Data<PgPool>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "chirp_deletion").with_user_id(caller.user_id);

    let chirp_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| ValidationError::InvalidId("chirp".to_string()))?;

    let chirp = fetch_chirp(pool.get_ref(), chirp_id).await?;
    if !chirp.is_owned_by(caller.user_id) {
        tracing::warn!(
            request_id = %context.request_id,
            chirp_id = %chirp.id,
            owner_id = %chirp.user_id,
            user_id = %caller.user_id,
            "Refusing to delete chirp owned by another user"
        );
        return Err(AuthError::NotResourceOwner.into());
    }

    sqlx::query("DELETE FROM chirps WHERE id = $1")
        .bind(chirp_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| context.record(e.into()))?;

    tracing::info!(request_id = %context.request_id, chirp_id = %chirp_id, "Chirp deleted");
    Ok(HttpResponse::NoContent().finish())
}

async fn fetch_chirp(pool: &PgPool, chirp_id: Uuid) -> Result<Chirp, AppError> {
    sqlx::query_as::<_, Chirp>(
        r#"
        SELECT id, created_at, updated_at, body, user_id
        FROM chirps
        WHERE id = $1
        "#,
    )
    .bind(chirp_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("chirp".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(author_id: Option<&str>, sort: Option<&str>) -> ListChirpsQuery {
        ListChirpsQuery {
            author_id: author_id.map(str::to_string),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn test_sort_defaults_to_ascending() {
        assert_eq!(query(None, None).order(), Ok(SortOrder::Asc));
        assert_eq!(query(None, Some("asc")).order(), Ok(SortOrder::Asc));
        assert_eq!(query(None, Some("desc")).order(), Ok(SortOrder::Desc));
        assert!(query(None, Some("sideways")).order().is_err());
    }

    #[test]
    fn test_author_filter_parsing() {
        let author = Uuid::new_v4();
        assert_eq!(query(None, None).author(), Ok(None));
        assert_eq!(query(Some(&author.to_string()), None).author(), Ok(Some(author)));
        assert_eq!(
            query(Some("nope"), None).author(),
            Err(ValidationError::InvalidQuery("author_id".to_string()))
        );
    }

    #[test]
    fn test_chirp_response_shape() {
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: "hello".to_string(),
            user_id: Uuid::new_v4(),
        };
        let user_id = chirp.user_id;

        let json = serde_json::to_value(ChirpResponse::from(chirp)).unwrap();
        assert_eq!(json["body"], "hello");
        assert_eq!(json["user_id"], user_id.to_string());
    }
}
