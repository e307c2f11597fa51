use time::format_description::parse;
use tracing_subscriber::fmt::time::OffsetTime;

use crate::config::TracingConfig;

/// Install the global tracing subscriber.
///
/// The configured level is the default; `RUST_LOG` overrides it
/// (e.g. `RUST_LOG=debug`). Called once by the embedding process at startup.
pub fn setup_tracing(config: &TracingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level))
        // Filter out noisy third-party logs
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_ansi(true)
        .with_timer(OffsetTime::new(
            time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
            parse("[hour]:[minute]:[second].[subsecond digits:2]").unwrap(),
        ))
        .compact()
        .init();
}
