//! Binary entry point for the docmod CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Reorganize a tree document by logical module
//! docmod reorganize tree.json --output reorganized.json
//!
//! # List the module tags a tree carries
//! docmod tags tree.json
//!
//! # Give fallback modules kind-groups and keep tags in comments
//! docmod --populate-fallback-groups --keep-tags reorganize tree.json
//! ```
//!
//! Responses are JSON on stdout; logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use docmod::cli::{run_reorganize, run_tags, write_response};
use docmod::config::{CliOverrides, ResolvedConfig};
use docmod_core::error::{DocmodError, OutputErrorCode};
use docmod_core::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Reorganize documentation symbol trees by logical module.
///
/// Reads a JSON tree document, moves `@module`-tagged symbols into the
/// modules declared with `@moduledefinition`, and writes the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "docmod", version, about = "Reorganize documentation symbol trees by logical module")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Project config file (default: docmod.json in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Give fallback modules a kind-group index.
    #[arg(long, global = true)]
    populate_fallback_groups: bool,

    /// Keep consumed module tags in comments.
    #[arg(long, global = true)]
    keep_tags: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_path: self.config.clone(),
            populate_fallback_groups: self.populate_fallback_groups.then_some(true),
            strip_tags: self.keep_tags.then_some(false),
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Reorganize a tree document by logical module.
    Reorganize {
        /// Tree document to read.
        input: PathBuf,
        /// Write the response here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List the module tags found in a tree document.
    Tags {
        /// Tree document to read.
        input: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, same as successful responses
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), DocmodError> {
    let workspace_root = std::env::current_dir()?;
    let config = ResolvedConfig::resolve(&workspace_root, &cli.global.overrides())?;

    match cli.command {
        Command::Reorganize { input, output } => {
            let response = run_reorganize(&input, &config)?;
            write_response(&response, output.as_deref())
        }
        Command::Tags { input } => {
            let response = run_tags(&input, &config)?;
            write_response(&response, None)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn reorganize_with_output() {
            let cli =
                Cli::try_parse_from(["docmod", "reorganize", "tree.json", "--output", "out.json"])
                    .unwrap();
            match cli.command {
                Command::Reorganize { input, output } => {
                    assert_eq!(input, PathBuf::from("tree.json"));
                    assert_eq!(output, Some(PathBuf::from("out.json")));
                }
                _ => panic!("expected Reorganize"),
            }
        }

        #[test]
        fn tags_command() {
            let cli = Cli::try_parse_from(["docmod", "tags", "tree.json"]).unwrap();
            assert!(matches!(cli.command, Command::Tags { .. }));
        }

        #[test]
        fn input_is_required() {
            assert!(Cli::try_parse_from(["docmod", "reorganize"]).is_err());
        }

        #[test]
        fn global_flags_after_subcommand() {
            let cli = Cli::try_parse_from([
                "docmod",
                "reorganize",
                "tree.json",
                "--keep-tags",
                "--populate-fallback-groups",
                "--log-level",
                "debug",
            ])
            .unwrap();
            let overrides = cli.global.overrides();
            assert_eq!(overrides.strip_tags, Some(false));
            assert_eq!(overrides.populate_fallback_groups, Some(true));
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
        }

        #[test]
        fn absent_flags_do_not_override() {
            let cli = Cli::try_parse_from(["docmod", "tags", "tree.json"]).unwrap();
            let overrides = cli.global.overrides();
            assert_eq!(overrides.strip_tags, None);
            assert_eq!(overrides.populate_fallback_groups, None);
            assert_eq!(overrides.config_path, None);
            assert_eq!(cli.global.log_format, LogFormat::Text);
        }
    }
}
