/// File server hit counting
///
/// Wraps the `/app` static file service and bumps the shared `ApiMetrics`
/// counter once per request, before the file is served.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::metrics::ApiMetrics;

pub struct HitCounter {
    metrics: web::Data<ApiMetrics>,
}

impl HitCounter {
    pub fn new(metrics: web::Data<ApiMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HitCounter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = HitCounterService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(HitCounterService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct HitCounterService<S> {
    service: Rc<S>,
    metrics: web::Data<ApiMetrics>,
}

impl<S, B> Service<ServiceRequest> for HitCounterService<S>
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
        self.metrics.record_hit();

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App, HttpResponse};

    #[actix_web::test]
    async fn test_each_request_is_counted() {
        let metrics = web::Data::new(ApiMetrics::new());
        let app = test::init_service(
            App::new().service(
                web::scope("/app")
                    .wrap(HitCounter::new(metrics.clone()))
                    .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/app/").to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        assert_eq!(metrics.hits(), 3);
    }
}
