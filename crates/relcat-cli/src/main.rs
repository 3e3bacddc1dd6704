// crates/relcat-cli/src/main.rs
//
// CLI entrypoint for the relcat release catalog client.
//
// Connects to a relcat server and prints either every release or a single
// release by version.

mod commands;
mod connection;
mod output;

use clap::{Parser, Subcommand};
use connection::ConnectArgs;
use output::OutputFormat;

/// relcat: query a release catalog server.
#[derive(Parser, Debug)]
#[command(name = "relcat", version = "0.1.0", about = "Release catalog client")]
struct Cli {
    #[command(flatten)]
    connect: ConnectArgs,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level subcommands. `list` runs when none is given.
#[derive(Debug, Subcommand)]
enum Commands {
    /// List every release, sorted by version.
    List,

    /// Show one release.
    Get {
        /// Release version, e.g. "1.9".
        version: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connection::connect(&cli.connect).await?;

    let mut out = std::io::stdout();

    match &cli.command {
        None | Some(Commands::List) => {
            commands::list::run(&mut client, &cli.format, &mut out).await?
        }
        Some(Commands::Get { version }) => {
            commands::get::run(&mut client, version, &cli.format, &mut out).await?
        }
    }

    Ok(())
}
