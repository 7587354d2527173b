mod cli;
mod config;
mod docker;
mod error;
mod gpu;
mod utils;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Usage errors exit with 1, help and version with 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    };

    // Initialize logging
    utils::logger::init(cli.verbose)?;

    cli.execute().await
}
