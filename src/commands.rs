//! CLI command definitions
//!
//! Defines the clap commands for the e2e harness.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios against the app (the built-in board check if none given)
    Run {
        /// YAML scenario files
        scenarios: Vec<PathBuf>,

        /// Config file (default: ./e2e.toml, then the user config dir)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Override the base URL from the config
        #[arg(long)]
        base_url: Option<String>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration
    Config {
        /// Config file (default: ./e2e.toml, then the user config dir)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// List scenario steps without running them
    List {
        /// YAML scenario files
        scenarios: Vec<PathBuf>,
    },
}

impl Commands {
    /// Whether verbose logging was requested
    pub fn is_verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}
