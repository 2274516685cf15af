#![forbid(unsafe_code)]

//! Structured logging for flexdock.
//!
//! Every crate in the workspace logs through `tracing`. This module re-exports
//! the macros so downstream crates can write `flexdock_core::debug!` without a
//! direct dependency, and (behind the `subscriber` feature) installs a
//! process-wide subscriber filtered by the `FLEXDOCK_LOG` environment variable.
//!
//! Targets used across the workspace:
//!
//! | target               | events                                    |
//! |----------------------|-------------------------------------------|
//! | `flexdock.dispatch`  | applied, rejected and vetoed actions      |
//! | `flexdock.drag`      | drag session transitions                  |
//! | `flexdock.persist`   | writes, migrations, corrupt-data recovery |
//! | `flexdock.shell`     | zone toggles and cross-zone moves         |

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV_VAR: &str = "FLEXDOCK_LOG";

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install a global `tracing` subscriber.
///
/// The filter is read from `FLEXDOCK_LOG` and defaults to `warn` when the
/// variable is unset or unparsable. Returns `false` if a global subscriber was
/// already installed.
#[cfg(feature = "subscriber")]
pub fn init(format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn reexported_macros_compile() {
        debug!(target: "flexdock.test", value = 1, "debug through re-export");
        let span = info_span!("flexdock.test.span");
        let _guard = span.enter();
        trace!("inside span");
    }
}
