use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT_LOGGING: Once = Once::new();

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// The filter comes from `RUST_LOG`, then `PITCHTRACK_LOG`, then `default_level`.
/// Later calls are no-ops.
pub fn init_logging(default_level: &str) {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| {
                EnvFilter::try_new(
                    std::env::var("PITCHTRACK_LOG").unwrap_or_else(|_| default_level.into()),
                )
            })
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);

        if let Err(err) = tracing_subscriber::registry().with(filter).with(layer).try_init() {
            eprintln!("failed to install log subscriber: {}", err);
        }
    });
}
