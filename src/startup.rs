use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::metrics::ApiMetrics;
use crate::middleware::HitCounter;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    metrics, polka_webhook, refresh, reset, revoke, update_user,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config = web::Data::new(settings.jwt);
    let polka_config = web::Data::new(settings.polka);
    let filepath_root = settings.application.filepath_root.clone();
    let application = web::Data::new(settings.application);
    // One counter shared by every worker
    let api_metrics = web::Data::new(ApiMetrics::new());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(connection.clone())
            .app_data(jwt_config.clone())
            .app_data(polka_config.clone())
            .app_data(application.clone())
            .app_data(api_metrics.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::Validation(ValidationError::InvalidQuery(err.to_string())).into()
            }))
            .route("/api/healthz", web::get().to(health_check))
            .service(
                web::resource("/api/users")
                    .route(web::post().to(create_user))
                    .route(web::put().to(update_user)),
            )
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .service(
                web::resource("/api/chirps")
                    .route(web::get().to(list_chirps))
                    .route(web::post().to(create_chirp)),
            )
            .service(
                web::resource("/api/chirps/{chirp_id}")
                    .route(web::get().to(get_chirp))
                    .route(web::delete().to(delete_chirp)),
            )
            .route("/api/polka/webhooks", web::post().to(polka_webhook))
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))
            // Static files; every request here bumps the hit counter
            .service(
                web::scope("/app")
                    .wrap(HitCounter::new(api_metrics.clone()))
                    .service(fs::Files::new("/", filepath_root.clone()).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
