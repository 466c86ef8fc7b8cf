use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_VAR: &str = "BERTH_LOG";

/// Logs go to stderr so `check --json` and `render` output stay clean on stdout.
///
/// `BERTH_LOG` wins over `RUST_LOG`; with neither set, `-v` picks the level.
pub fn init(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let env_filter = EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .init();
}
