//! Logging setup

use crate::PipelineError;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global `tracing` subscriber.
///
/// `level` is one of `trace`, `debug`, `info`, `warn`, `error`. Fails if
/// the level is unknown or a subscriber is already installed.
pub fn init_logging(level: &str, json: bool) -> Result<(), PipelineError> {
    let level = Level::from_str(level)
        .map_err(|_| PipelineError::Config(format!("unknown log level '{}'", level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| PipelineError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_is_config_error() {
        assert!(matches!(
            init_logging("loud", false),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_second_init_is_error_not_panic() {
        let first = init_logging("debug", false);
        let second = init_logging("info", true);
        // Another test may have installed the subscriber first
        assert!(first.is_err() || second.is_err());
        assert!(matches!(second, Err(PipelineError::Logging(_))));
    }
}
