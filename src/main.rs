use chirpy::configuration::get_configuration;
use chirpy::startup::run;
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting Chirpy");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            e.to_string(),
        ));
    }
    tracing::info!(platform = %configuration.application.platform, "Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        address = %address,
        filepath_root = %configuration.application.filepath_root,
        "Serving files and API"
    );

    run(listener, pool, configuration)?.await
}
