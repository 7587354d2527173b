use anyhow::{Context, Result};
use std::process::Command;

use super::config::ContainerConfig;

/// Arguments for `<runtime> run`, in order
pub fn run_args(config: &ContainerConfig) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    if config.interactive {
        args.push("-it".to_string());
    }
    args.extend(["--name".to_string(), config.name.clone()]);
    args.extend(["-p".to_string(), config.port_mapping.clone()]);

    for device in &config.access.devices {
        args.extend(["--device".to_string(), device.clone()]);
    }
    for group in &config.access.groups {
        args.extend(["--group-add".to_string(), group.clone()]);
    }
    if config.access.all_gpus {
        args.extend(["--gpus".to_string(), "all".to_string()]);
    }

    args.push(config.image.clone());
    args
}

/// Human-readable command line, shell-quoted where needed
pub fn display_command(runtime: &str, config: &ContainerConfig) -> String {
    std::iter::once(runtime.to_string())
        .chain(run_args(config))
        .map(|a| shell_escape(&a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the container in the foreground with inherited stdio and return the
/// runtime's exit code. Termination by signal is reported as 1.
pub fn run_container(runtime: &str, config: &ContainerConfig) -> Result<i32> {
    tracing::debug!("Launching: {}", display_command(runtime, config));

    let status = Command::new(runtime)
        .args(run_args(config))
        .status()
        .with_context(|| format!("Failed to run '{}'. Is it installed and on PATH?", runtime))?;

    Ok(status.code().unwrap_or(1))
}

/// Shell-escape a string for safe inclusion in a shell command
fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().any(|c| " \t\n\"'\\$`!*?[]{}();<>&|".contains(c)) {
        format!("'{}'", s.replace('\'', "'\\''"))
    } else {
        s.to_string()
    }
}
