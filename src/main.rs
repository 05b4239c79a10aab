//! Command-line entry point.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use i18n_catalog_sync::config::ConfigManager;
use i18n_catalog_sync::driver::{
    Driver,
    RunMode,
    RunOptions,
};
use i18n_catalog_sync::logging;
use i18n_catalog_sync::report::RunReport;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "i18n-catalog-sync")]
#[command(about = "Keeps translated message catalogs in sync with a reference locale", long_about = None)]
#[command(version)]
struct Cli {
    /// What to do.
    #[command(subcommand)]
    command: Command,

    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Settings file (defaults to `.i18n-sync.json` in the workspace root)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Run modes.
#[derive(Debug, Subcommand)]
enum Command {
    /// Report drift without translating or writing anything
    Check(LocaleArgs),
    /// Translate missing and placeholder keys and write the catalogs
    Sync(LocaleArgs),
}

/// Locale selection shared by both subcommands.
#[derive(Debug, Args)]
struct LocaleArgs {
    /// Only process this locale (repeatable)
    #[arg(long = "locale", value_name = "CODE")]
    locales: Vec<String>,
}

/// Prints the report to stdout as text or JSON.
fn write_report(report: &RunReport, json: bool) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, report)?;
        writeln!(stdout)
    } else {
        write!(stdout, "{report}")
    }
}

/// Loads settings, runs the driver and prints the report.
async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let mut config = ConfigManager::new(root);
    config.load_settings(cli.config.as_deref())?;

    let (mode, locales) = match cli.command {
        Command::Check(args) => (RunMode::Check, args.locales),
        Command::Sync(args) => (RunMode::Sync, args.locales),
    };

    let driver = Driver::with_http_provider(config)?;
    let report = driver.run(&RunOptions { mode, locales }).await?;
    write_report(&report, cli.json)?;

    Ok(exit_code(mode, &report))
}

/// `check` exits 2 on drift, undefined keys or aborted locales.
fn exit_code(mode: RunMode, report: &RunReport) -> ExitCode {
    if mode == RunMode::Check && !report.is_clean() { ExitCode::from(2) } else { ExitCode::SUCCESS }
}

/// Exit codes: 0 on success, 1 on a fatal error, 2 when `check` finds problems.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Failed to initialise logging: {e}");
            None
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use i18n_catalog_sync::report::{
        LocaleReport,
        LocaleStatus,
    };
    use rstest::rstest;

    use super::*;

    fn report_with(status: LocaleStatus) -> RunReport {
        RunReport { locales: vec![LocaleReport::new("zh", status)], ..RunReport::new("en", 1) }
    }

    #[rstest]
    #[case::check_clean(RunMode::Check, LocaleStatus::Checked, ExitCode::SUCCESS)]
    #[case::check_aborted(RunMode::Check, LocaleStatus::Aborted { error: "invalid JSON".to_string() }, ExitCode::from(2))]
    #[case::sync_aborted(RunMode::Sync, LocaleStatus::Aborted { error: "invalid JSON".to_string() }, ExitCode::SUCCESS)]
    fn exit_code_reflects_aborted_locales(
        #[case] mode: RunMode,
        #[case] status: LocaleStatus,
        #[case] expected: ExitCode,
    ) {
        assert_eq!(exit_code(mode, &report_with(status)), expected);
    }
}
