pub mod launch;
pub mod prompt;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::settings::Settings;
use crate::gpu::probe::SystemProbe;
use launch::{Backend, LaunchOptions};

#[derive(Parser, Debug)]
#[command(name = "localai-launcher")]
#[command(author = "LocalAI Team")]
#[command(version)]
#[command(about = "Detect the host GPU and start the matching LocalAI container", long_about = None)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Container name
    #[arg(long, default_value = "local-ai", allow_hyphen_values = true)]
    name: String,

    /// Port mapping passed to the container runtime
    #[arg(short = 'p', value_name = "HOST:CONTAINER", default_value = "8080:8080", allow_hyphen_values = true)]
    port: String,

    /// Use GPU acceleration without asking
    #[arg(short, long)]
    yes: bool,

    /// Print the launch command instead of running it
    #[arg(long, conflicts_with = "engine_api")]
    dry_run: bool,

    /// Start the container through the Docker Engine API instead of the CLI
    #[arg(long)]
    engine_api: bool,

    /// Settings file (defaults to ~/.localai/launcher.yaml)
    #[arg(long, value_name = "FILE", env = "LOCALAI_LAUNCHER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn options(&self) -> LaunchOptions {
        LaunchOptions {
            name: self.name.clone(),
            port_mapping: self.port.clone(),
        }
    }

    fn backend(&self) -> Backend {
        if self.dry_run {
            Backend::DryRun
        } else if self.engine_api {
            Backend::EngineApi
        } else {
            Backend::Cli
        }
    }

    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let options = self.options();

        let config = {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            launch::plan_launch(
                &options,
                &settings,
                &SystemProbe,
                self.yes,
                &mut stdin.lock(),
                &mut stdout.lock(),
            )?
        };

        let exit_code = launch::launch(&config, &settings, self.backend()).await?;
        if exit_code != 0 {
            std::process::exit(exit_code);
        }

        Ok(())
    }
}
