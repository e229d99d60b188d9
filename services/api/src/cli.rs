use crate::demo::{run_digest, run_recommend, DigestArgs, RecommendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deal_genie::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Deal Genie",
    about = "Serve and exercise Deal Genie lead personalization from the command line",
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
    /// Print personalized picks for one session token
    Recommend(RecommendArgs),
    /// Run the weekly genie-picks digest against the seeded subscribers
    Digest(DigestArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the catalog from a CSV export instead of the demo data
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Seed user activity from a CSV export instead of the demo data
    #[arg(long)]
    pub(crate) activity_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Recommend(args) => run_recommend(args).await,
        Command::Digest(args) => run_digest(args).await,
    }
}
