//! # hyperschema CLI Entry Point
//!
//! Parses arguments and dispatches to [`hs_cli::commands`].

use std::io::Write;

use clap::Parser;
use hs_cli::commands::{self, GlobalArgs, ShowArgs, ValidateArgs};
use hs_schema::SchemaRegistry;

/// hyperschema: inspect and exercise a JSON Schema directory.
#[derive(Parser, Debug)]
#[command(name = "hyperschema", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List schema names.
    List,
    /// Print a schema with `${base_url}` substituted.
    Show(ShowArgs),
    /// Validate a JSON or YAML document against a schema.
    Validate(ValidateArgs),
    /// Compile every schema and report failures.
    Check,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.global.config();
    tracing::debug!(schema_path = %config.schema_path.display(), "using schema directory");
    let registry = SchemaRegistry::new(&config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::List => commands::list(&registry, &mut out),
        Commands::Show(args) => commands::show(&registry, args, &mut out),
        Commands::Validate(args) => commands::validate(&registry, args, &mut out),
        Commands::Check => commands::check(&registry, &mut out),
    };
    out.flush()?;
    result
}
