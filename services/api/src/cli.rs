use crate::report::{run_import, run_template, ImportArgs, TemplateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use doctor_ranker::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Doctor Ranker",
    about = "Score, rank and import doctor rosters from the command line",
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
    /// Validate a roster CSV and optionally score it under a weight configuration
    Import(ImportArgs),
    /// Print the canonical import template as CSV
    Template(TemplateArgs),
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
        Command::Import(args) => run_import(args),
        Command::Template(args) => run_template(args),
    }
}
