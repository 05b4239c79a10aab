//! Tracing subscriber setup for the command-line entry point.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose { "i18n_catalog_sync=debug,info" } else { "info" }
}

/// Installs the global subscriber. Logs go to stderr so that stdout only carries the report.
/// `verbose` enables debug records from this crate when `RUST_LOG` is unset.
///
/// With `log_file`, records are also appended to that file through a background writer;
/// keep the returned guard alive until exit so buffered lines are flushed.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stderr.and(file_writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init()?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::quiet(false, "info")]
    #[case::verbose(true, "i18n_catalog_sync=debug,info")]
    fn default_directive_follows_verbosity(#[case] verbose: bool, #[case] expected: &str) {
        assert_eq!(default_directive(verbose), expected);
        assert!(EnvFilter::try_new(expected).is_ok());
    }
}
