mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::encode::EncodeArgs;
use commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "remcall", version, about = "Remote method-call node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a batch of messages against an object store fixture
    Run(RunArgs),

    /// Print the CBOR wire encoding of each message in a batch
    Encode(EncodeArgs),
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => commands::run::cmd_run(&args),
        Command::Encode(args) => commands::encode::cmd_encode(&args),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
