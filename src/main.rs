//! Board E2E CLI
//!
//! Runs end-to-end browser scenarios against a falling-block puzzle web app.

use board_e2e::{cli, commands, common::logging};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "board-e2e", about = "End-to-end browser checks for the puzzle app")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.is_verbose());

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
