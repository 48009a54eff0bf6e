use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::fmt;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier shared by every log line of one request
///
/// `LoggerMiddleware` stores it in the request extensions; handlers pull it
/// back out as an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromRequest for RequestId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    // Outside the middleware (unit tests) a fresh id is minted.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<RequestId>()
            .copied()
            .unwrap_or_default()))
    }
}

/// Request logging middleware
///
/// Emits one structured event when a request starts and one when it
/// completes, tagged with a per-request id. The id is also echoed back in
/// the `x-request-id` response header.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = RequestId::new();
        let method = req.method().to_string();
        let path = req.path().to_string();

        req.extensions_mut().insert(request_id);
        tracing::info!(%request_id, %method, %path, "Request started");

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;
            let status = res.status().as_u16();
            let elapsed_ms = start_time.elapsed().as_millis() as u64;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            match res.response().error() {
                Some(error) if res.status().is_server_error() => {
                    tracing::error!(%request_id, %method, %path, status, elapsed_ms, %error, "Request failed");
                }
                Some(error) => {
                    tracing::warn!(%request_id, %method, %path, status, elapsed_ms, %error, "Request rejected");
                }
                None => {
                    tracing::info!(%request_id, %method, %path, status, elapsed_ms, "Request completed");
                }
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn echo_request_id(request_id: RequestId) -> HttpResponse {
        HttpResponse::Ok().body(request_id.to_string())
    }

    #[actix_web::test]
    async fn test_handler_sees_the_logged_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(echo_request_id)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = test::read_body(resp).await;

        assert_eq!(body.as_ref(), header.as_bytes());
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[actix_web::test]
    async fn test_each_request_gets_its_own_id() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(echo_request_id)),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let second = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_ne!(
            first.headers().get(REQUEST_ID_HEADER),
            second.headers().get(REQUEST_ID_HEADER)
        );
    }

    #[actix_web::test]
    async fn test_extractor_without_middleware_mints_an_id() {
        let app = test::init_service(App::new().route("/", web::get().to(echo_request_id))).await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(Uuid::parse_str(std::str::from_utf8(&body).unwrap()).is_ok());
    }
}
