//! Diagnostic logging on stderr.
//!
//! Filter comes from `MEDIABOX_LOG` when set, otherwise `--verbose` picks
//! `debug` and the default is `warn`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::LogFormat;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "MEDIABOX_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

pub fn init(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let result = match format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    // Ignore error if subscriber was already set
    let _ = result;
}
