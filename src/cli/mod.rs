//! Command-line entry point for `harness = false` test targets
//!
//! A test target declares its suites inside a closure and hands it to [`main`]:
//!
//! ```no_run
//! use testbed::{FactoryProvider, FixtureConfig, Suite};
//!
//! fn main() {
//!     testbed::cli::main(|harness| {
//!         Suite::create("Counter", FactoryProvider::<(), u32>::infallible(|_| 0))
//!             .inject(FixtureConfig::new(()))
//!             .test("starts at zero", |count| assert_eq!(count, 0))
//!             .run(harness);
//!     });
//! }
//! ```
//!
//! ## Flags
//!
//! - `-v`, `--verbose` - one line per case
//! - `-x`, `--exitfirst` - stop on first failure
//! - `-k EXPR` or a positional filter - only run cases whose name contains `EXPR`
//! - `--format console|json` - report format
//! - `--timeout-ms N` - fail async cases that take longer than `N` ms
//! - `--no-color` - plain console output
//!
//! Flags that cargo's own harness understands (`--nocapture`, `--test-threads`, ...) are accepted and ignored.
//!
//! ## Design
//!
//! Functions here return `CliResult<T>` instead of calling `process::exit`. Only [`main`] exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{HarnessConfig, OutputFormat};
use crate::report::{ConsoleReporter, JsonReporter, RunReport, TestReporter};
use crate::runner::Harness;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. [`main`] prints the message and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[value(aliases = ["pretty", "terse"])]
    Console,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Console => OutputFormat::Console,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Run the declared test suites
#[derive(Parser, Debug)]
#[command(name = "testbed")]
#[command(about = "Run declared test suites", long_about = None)]
#[command(ignore_errors = true)]
pub struct Cli {
    /// Only run cases whose name contains this keyword
    #[arg(value_name = "FILTER")]
    pub positional_filter: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Filter cases by keyword
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = FormatArg::Console)]
    pub format: FormatArg,

    /// Timeout for async cases, in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Disable ANSI colors
    #[arg(long = "no-color")]
    pub no_color: bool,

    // Flags passed by `cargo test`; accepted so their values are not mistaken for a filter
    #[arg(long, hide = true)]
    pub nocapture: bool,

    #[arg(long = "test-threads", value_name = "N", hide = true)]
    pub test_threads: Option<usize>,

    #[arg(short, long, hide = true)]
    pub quiet: bool,

    #[arg(long, hide = true)]
    pub exact: bool,

    #[arg(long, hide = true)]
    pub ignored: bool,

    #[arg(long = "include-ignored", hide = true)]
    pub include_ignored: bool,
}

impl Cli {
    /// Build the harness configuration. `-k` wins over a positional filter.
    pub fn to_config(&self) -> CliResult<HarnessConfig> {
        let mut config = HarnessConfig::new()
            .with_verbose(self.verbose)
            .with_stop_on_fail(self.stop_on_fail)
            .with_color(!self.no_color)
            .with_format(self.format.into());

        if let Some(keyword) = self.filter.as_ref().or(self.positional_filter.as_ref()) {
            config = config.with_filter(keyword.clone());
        }

        match self.timeout_ms {
            Some(0) => return Err(CliError::failure("Error: --timeout-ms must be greater than zero")),
            Some(ms) => config = config.with_async_timeout(Duration::from_millis(ms)),
            None => {}
        }

        Ok(config)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Parse process arguments, run the suites declared by `declare`, and exit.
///
/// This is the only place where `process::exit` is called.
pub fn main(declare: impl FnOnce(&mut Harness)) {
    // Initialize structured logging with env-based filter, defaulting to warn
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match execute(&cli, declare) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Declare, execute and report. Returns `FAILURE` when any case failed.
pub fn execute(cli: &Cli, declare: impl FnOnce(&mut Harness)) -> CliResult<ExitCode> {
    let config = cli.to_config()?;
    let mut reporter: Box<dyn TestReporter> = match config.format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(config.verbose).with_color(config.color)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };

    let report = run_with(config, declare, reporter.as_mut());

    if report.summary.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed by the reporter
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// Build a harness from `config`, let `declare` register suites on it, and execute.
pub fn run_with(
    config: HarnessConfig,
    declare: impl FnOnce(&mut Harness),
    reporter: &mut dyn TestReporter,
) -> RunReport {
    let mut harness = Harness::new(config);
    declare(&mut harness);
    if harness.registered_cases() == 0 {
        tracing::warn!("no cases registered");
    }
    harness.execute(reporter)
}

// ============================================================================
// Tests
// ============================================================================
