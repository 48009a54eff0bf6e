use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global JSON subscriber.
///
/// The level comes from `RUST_LOG` and falls back to `info`. Calling this a
/// second time in one process is a no-op.
pub fn init_telemetry() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_twice_does_not_panic() {
        init_telemetry();
        init_telemetry();
        tracing::info!("telemetry initialised");
    }
}
