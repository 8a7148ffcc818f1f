//! Tracing subscriber setup.
//!
//! Priority: `RUST_LOG` env var > configured log level. Output goes to
//! stderr so the conversation on stdout stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. A second call is a no-op.
pub fn init_telemetry(log_level: &str) {
    let default_filter = format!("warn,boin_assistant={}", log_level.trim().to_ascii_lowercase());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
