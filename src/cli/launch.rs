use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::cli::prompt;
use crate::config::settings::Settings;
use crate::docker::client::DockerClient;
use crate::docker::command;
use crate::docker::config::ContainerConfig;
use crate::gpu::image::{self, ImageVariant};
use crate::gpu::probe::{self, DetectedGpu, HostProbe};

/// Container name and port mapping, fixed once arguments are parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub name: String,
    pub port_mapping: String,
}

/// How the single launch is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cli,
    EngineApi,
    DryRun,
}

/// Detect, ask, select. Returns the container to start.
pub fn plan_launch<R: BufRead, W: Write>(
    options: &LaunchOptions,
    settings: &Settings,
    probe: &dyn HostProbe,
    assume_yes: bool,
    input: &mut R,
    output: &mut W,
) -> Result<ContainerConfig> {
    let detected = probe::detect(probe);

    let accelerate = match detected.vendor_name() {
        None => {
            writeln!(output, "{} No GPU detected, using the CPU image", "=>".blue().bold())?;
            false
        }
        Some(vendor) => {
            writeln!(output, "{} {} GPU detected", "=>".blue().bold(), vendor.cyan())?;
            if assume_yes {
                true
            } else {
                prompt::ask_yes_no(input, output, &format!("Use {} GPU acceleration?", vendor))?
            }
        }
    };

    let variant = image::select_variant(&detected, accelerate)?;
    tracing::debug!("Selected {:?} for {:?} (accelerate: {})", variant, detected, accelerate);

    if variant == ImageVariant::Cpu && !matches!(detected, DetectedGpu::None) {
        writeln!(output, "{} GPU acceleration declined, using the CPU image", "=>".blue().bold())?;
    }

    Ok(ContainerConfig {
        name: options.name.clone(),
        port_mapping: options.port_mapping.clone(),
        image: settings.image_ref(variant.tag()),
        access: variant.device_access(),
        interactive: true,
    })
}

/// Start the container and return the exit code the launcher should use
pub async fn launch(config: &ContainerConfig, settings: &Settings, backend: Backend) -> Result<i32> {
    match backend {
        Backend::DryRun => {
            println!("{}", command::display_command(&settings.runtime, config));
            Ok(0)
        }
        Backend::Cli => {
            println!(
                "{} Starting {} from {}",
                "=>".blue().bold(),
                config.name.cyan(),
                config.image.cyan()
            );
            command::run_container(&settings.runtime, config)
        }
        Backend::EngineApi => {
            println!(
                "{} Starting {} from {} via the Docker Engine API",
                "=>".blue().bold(),
                config.name.cyan(),
                config.image.cyan()
            );
            let client = DockerClient::new().await?;
            let code = client.run_container_attached(config).await?;
            Ok(i32::try_from(code).unwrap_or(1))
        }
    }
}
