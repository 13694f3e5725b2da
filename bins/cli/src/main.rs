//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    Backend, ScenarioRunArgs, run_class_create, run_class_delete, run_class_show,
    run_class_verify, run_config_show, run_scenarios_list, run_scenarios_run, run_schema_show,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode, format_error_output};
use index_config_config::load_client_config_std_env;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ixc",
    version,
    about = "Create and verify vector index configurations on a vector database",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Config file path (JSON or TOML). Environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Built-in index configuration scenarios.
    Scenarios {
        #[command(subcommand)]
        command: ScenarioCommands,
    },
    /// Single-class operations.
    Class {
        #[command(subcommand)]
        command: ClassCommands,
    },
    /// Schema-wide operations.
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ScenarioCommands {
    /// List the scenario catalog.
    List,
    /// Recreate and verify each scenario's class in turn.
    Run {
        /// Run only the named scenario (repeatable).
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
        /// Continue after a failed scenario.
        #[arg(long)]
        keep_going: bool,
        /// Use an in-process store instead of the configured service.
        #[arg(long)]
        in_memory: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ClassCommands {
    /// Create a class from a definition file.
    Create {
        /// Definition file (JSON, or TOML by extension).
        #[arg(long)]
        file: PathBuf,
        /// Delete an existing class of the same name first.
        #[arg(long)]
        recreate: bool,
    },
    /// Print a class as stored by the service.
    Show {
        /// Class name.
        name: String,
    },
    /// Delete a class.
    Delete {
        /// Class name.
        name: String,
    },
    /// Check a stored class against a definition file.
    Verify {
        /// Definition file (JSON, or TOML by extension).
        #[arg(long)]
        file: PathBuf,
        /// Fail on any requested setting the service did not keep.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SchemaCommands {
    /// List the classes the service holds.
    Show,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config with secrets redacted.
    Show,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    init_tracing(mode);

    match run(&cli, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

/// Verbose runs trace to stderr, as JSON lines under `--output json`.
fn init_tracing(mode: OutputMode) {
    if !mode.verbose {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("index_config_adapters=debug,index_config_app=debug,ixc=debug,warn")
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let _ = if mode.is_json() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    let config = match load_client_config_std_env(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    tracing::debug!(url = %config.connection.url, "config loaded");

    match &cli.command {
        Commands::Scenarios { command } => match command {
            ScenarioCommands::List => run_scenarios_list(mode, &config),
            ScenarioCommands::Run {
                only,
                keep_going,
                in_memory,
            } => run_scenarios_run(
                mode,
                &config,
                ScenarioRunArgs {
                    only,
                    keep_going: *keep_going,
                    backend: if *in_memory {
                        Backend::InMemory
                    } else {
                        Backend::Rest
                    },
                },
            ),
        },
        Commands::Class { command } => match command {
            ClassCommands::Create { file, recreate } => {
                run_class_create(mode, &config, file, *recreate)
            },
            ClassCommands::Show { name } => run_class_show(mode, &config, name),
            ClassCommands::Delete { name } => run_class_delete(mode, &config, name),
            ClassCommands::Verify { file, strict } => {
                run_class_verify(mode, &config, file, *strict)
            },
        },
        Commands::Schema {
            command: SchemaCommands::Show,
        } => run_schema_show(mode, &config),
        Commands::Config {
            command: ConfigCommands::Show,
        } => run_config_show(mode, &config, cli.config.as_deref()),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
