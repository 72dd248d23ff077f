//! CLI binary entry point for message-etl

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use message_etl::cli::commands::init::{InitConfigArgs, handle_init_config};
#[cfg(feature = "cli")]
use message_etl::cli::commands::run::{ReportFormat, RunArgs, handle_run};
#[cfg(feature = "cli")]
use message_etl::cli::commands::schema::{SchemaArgs, handle_schema};
#[cfg(feature = "cli")]
use message_etl::config::CONFIG_FILENAME;
#[cfg(feature = "cli")]
use message_etl::decode::DEFAULT_CATEGORY_COLUMN;
#[cfg(feature = "cli")]
use message_etl::{FlagPolicy, NamePolicy};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "cli")]
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "message-etl")]
#[command(about = "Load, decode, merge and deduplicate labelled messages into a database")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the cleaned table
    Run {
        /// Messages file (falls back to the config file)
        messages: Option<PathBuf>,
        /// Categories file (falls back to the config file)
        categories: Option<PathBuf>,
        /// Destination: duckdb://<path>, sqlite:///<path>, a .duckdb or .db file, or postgres://...
        destination: Option<String>,
        /// Destination table name [default: messages]
        #[arg(short, long)]
        table: Option<String>,
        /// Configuration file (defaults to ./message-etl.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Join on this key column
        #[arg(long, conflicts_with = "positional")]
        key: Option<String>,
        /// Join rows by position; requires equal row counts
        #[arg(long)]
        positional: bool,
        /// Compound label column in the categories file
        #[arg(long)]
        category_column: Option<String>,
        /// Field delimiter for both input files
        #[arg(short, long)]
        delimiter: Option<char>,
        /// How category names are derived (verbatim, strip-digits)
        #[arg(long)]
        name_policy: Option<NamePolicy>,
        /// How flag values are checked (binary, clamp, raw)
        #[arg(long)]
        flag_policy: Option<FlagPolicy>,
        /// Transform and report without writing
        #[arg(long)]
        dry_run: bool,
        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Print the category names decoded from a categories file
    Schema {
        /// Categories file
        categories: PathBuf,
        /// Compound label column
        #[arg(long, default_value = DEFAULT_CATEGORY_COLUMN)]
        category_column: String,
        /// Field delimiter
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,
        /// How category names are derived (verbatim, strip-digits)
        #[arg(long, default_value = "verbatim")]
        name_policy: NamePolicy,
        /// How flag values are checked (binary, clamp, raw)
        #[arg(long, default_value = "binary")]
        flag_policy: FlagPolicy,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Write a sample configuration file
    InitConfig {
        /// Target file or directory
        #[arg(default_value = CONFIG_FILENAME)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
}

#[cfg(feature = "cli")]
fn convert_format(format: FormatArg) -> ReportFormat {
    match format {
        FormatArg::Text => ReportFormat::Text,
        FormatArg::Json => ReportFormat::Json,
    }
}

/// Install the log subscriber; logs go to stderr so reports stay on stdout
#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let fallback = match verbose {
        0 => "message_etl=info",
        1 => "message_etl=debug",
        _ => "message_etl=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install log subscriber")
}

#[cfg(feature = "cli")]
fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            messages,
            categories,
            destination,
            table,
            config,
            key,
            positional,
            category_column,
            delimiter,
            name_policy,
            flag_policy,
            dry_run,
            format,
        } => {
            let args = RunArgs {
                messages,
                categories,
                destination,
                table,
                config,
                key,
                positional,
                category_column,
                delimiter,
                name_policy,
                flag_policy,
                dry_run,
                format: convert_format(format),
            };
            handle_run(&args)?;
        }
        Commands::Schema {
            categories,
            category_column,
            delimiter,
            name_policy,
            flag_policy,
            format,
        } => {
            let args = SchemaArgs {
                categories,
                column: category_column,
                delimiter,
                name_policy,
                flag_policy,
                format: convert_format(format),
            };
            handle_schema(&args)?;
        }
        Commands::InitConfig { path, force } => {
            handle_init_config(&InitConfigArgs { path, force })?;
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = init_tracing(cli.verbose).and_then(|()| dispatch(cli.command));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
