use crate::demo::{run_demo, run_screen, DemoArgs, ScreenArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crew_screening::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Crew Screening Service",
    about = "Score maritime crew candidates and serve the screening API",
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
    /// Score one candidate from a contract CSV and optional interview answers
    Screen(ScreenArgs),
    /// Run the full pipeline over seeded sample candidates
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
        Command::Screen(args) => run_screen(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
