//! Tracing subscriber initialization.

use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use komuchi_core::Config;

/// Install the global tracing subscriber: compact console output during
/// development, JSON lines in production. `RUST_LOG` overrides the default
/// filter.
pub fn init_telemetry(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,komuchi_api=debug,komuchi_worker=debug,tower_http=debug".into()
    });

    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let console_fmt = tracing_subscriber::fmt::layer()
            .event_format(Format::default().compact().with_target(false).without_time());
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_fmt)
            .init();
    }
}
