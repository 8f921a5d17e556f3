use crate::demo::{print_catalog, run_demo, run_interactive, DemoArgs, RunArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use esg_maturity::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ESG Maturity Survey",
    about = "Serve, run, and demonstrate the ESG maturity survey from the command line",
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
    /// Print the question catalog grouped by section
    Catalog,
    /// Take the survey interactively in this terminal
    Run(RunArgs),
    /// Run a scripted respondent through the full survey
    Demo(DemoArgs),
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
        Command::Catalog => {
            print_catalog();
            Ok(())
        }
        Command::Run(args) => run_interactive(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
