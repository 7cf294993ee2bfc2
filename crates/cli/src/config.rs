//! Command-line configuration and logging setup.

use clap::Parser;
use tracing::Level;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "oracle-cli", version, about = "Inspect which replica each range is read from")]
pub struct CliConfig {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);
        let result = self.command.execute()?;
        print!("{}", result);
        Ok(())
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .init();
}
