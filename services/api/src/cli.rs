use crate::evaluate::{run_evaluate, run_rules, EvaluateArgs, RulesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use claim_scan::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Claim Packet Scanner",
    about = "Score water-damage restoration claim packets for completeness and rejection risk",
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
    /// Evaluate a local directory of packet files and print the result
    Evaluate(EvaluateArgs),
    /// Print the effective rule table as JSON
    Rules(RulesArgs),
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Rules(args) => run_rules(args),
    }
}
