use crate::proof::{run_proof, ProofArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use identity_proofing::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Identity Proofing Service",
    about = "Run the identity proofing service or proof a single stage from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Proof one stage in-process and print the resulting JSON
    Proof(ProofArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Proof(args) => run_proof(args).await,
    }
}
