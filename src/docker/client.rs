use anyhow::{Context, Result};
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerWaitResponse, DeviceMapping, DeviceRequest, HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

use super::config::ContainerConfig;

/// Docker Engine API client used by `--engine-api`
pub struct DockerClient {
    docker: Docker,
}

/// A parsed `[IP:]HOST:CONTAINER[/PROTO]` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: Option<String>,
    pub host_port: String,
    /// Container side including protocol, e.g. `8080/tcp`
    pub container_port: String,
}

impl PortMapping {
    pub fn parse(mapping: &str) -> Result<Self> {
        let (ports, proto) = match mapping.rsplit_once('/') {
            Some((ports, proto)) => (ports, proto),
            None => (mapping, "tcp"),
        };

        let parts: Vec<&str> = ports.split(':').collect();
        let (host_ip, host_port, container_port) = match parts.as_slice() {
            [host, container] => (None, *host, *container),
            [ip, host, container] => (Some(ip.to_string()), *host, *container),
            _ => anyhow::bail!(
                "Invalid port mapping: {}. Expected HOST:CONTAINER or IP:HOST:CONTAINER",
                mapping
            ),
        };

        for port in [host_port, container_port] {
            port.parse::<u16>()
                .with_context(|| format!("Invalid port '{}' in mapping {}", port, mapping))?;
        }

        Ok(Self {
            host_ip,
            host_port: host_port.to_string(),
            container_port: format!("{}/{}", container_port, proto),
        })
    }
}

impl DockerClient {
    /// Create a new Docker client
    pub async fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon. Is Docker running?")?;

        // Verify connection
        docker
            .ping()
            .await
            .context("Failed to ping Docker daemon")?;

        Ok(Self { docker })
    }

    /// Pull the image unless it is already present locally
    pub async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            tracing::debug!("Image {} already present", image);
            return Ok(());
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("Invalid spinner template")?,
        );
        pb.set_message(format!("Pulling {}...", image));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let result = self.pull_image(image).await;
        pb.finish_and_clear();
        result
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::debug!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("Pull failed: {}", e));
                }
            }
        }

        Ok(())
    }

    /// Run a container, stream its output and return its exit code
    pub async fn run_container_attached(&self, config: &ContainerConfig) -> Result<i64> {
        self.ensure_image(&config.image).await?;

        let container_id = self.create_container(config).await?;

        self.docker
            .start_container(&container_id, None::<StartContainerOptions<String>>)
            .await
            .with_context(|| format!("Failed to start container '{}'", config.name))?;

        let log_options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut log_stream = self.docker.logs(&container_id, Some(log_options));

        while let Some(result) = log_stream.next().await {
            match result {
                Ok(output) => {
                    print!("{}", output);
                }
                Err(e) => {
                    tracing::warn!("Log stream error: {}", e);
                    break;
                }
            }
        }

        let wait_options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut wait_stream = self.docker.wait_container(&container_id, Some(wait_options));
        Ok(wait_exit_code(wait_stream.next().await))
    }

    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        let (options, container_config) = container_spec(config)?;

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .with_context(|| format!("Failed to create container '{}'", config.name))?;

        for warning in &response.warnings {
            tracing::warn!("{}", warning);
        }

        Ok(response.id)
    }
}

/// Translate a container description into Engine API create parameters
pub fn container_spec(config: &ContainerConfig) -> Result<(CreateContainerOptions<String>, Config<String>)> {
    let mapping = PortMapping::parse(&config.port_mapping)?;

    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        mapping.container_port.clone(),
        Some(vec![PortBinding {
            host_ip: mapping.host_ip.clone(),
            host_port: Some(mapping.host_port.clone()),
        }]),
    );

    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(mapping.container_port.clone(), HashMap::new());

    let devices: Vec<DeviceMapping> = config
        .access
        .devices
        .iter()
        .map(|path| DeviceMapping {
            path_on_host: Some(path.clone()),
            path_in_container: Some(path.clone()),
            cgroup_permissions: Some("rwm".to_string()),
        })
        .collect();

    let mut host_config = HostConfig {
        port_bindings: Some(port_bindings),
        devices: Some(devices),
        group_add: Some(config.access.groups.clone()),
        ..Default::default()
    };

    if config.access.all_gpus {
        host_config.device_requests = Some(vec![DeviceRequest {
            driver: Some("nvidia".to_string()),
            count: Some(-1), // All available GPUs
            capabilities: Some(vec![vec!["gpu".to_string()]]),
            ..Default::default()
        }]);
    }

    let container_config = Config {
        image: Some(config.image.clone()),
        exposed_ports: Some(exposed_ports),
        tty: Some(config.interactive),
        open_stdin: Some(config.interactive),
        attach_stdin: Some(config.interactive),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        host_config: Some(host_config),
        ..Default::default()
    };

    let options = CreateContainerOptions {
        name: config.name.clone(),
        platform: None,
    };

    Ok((options, container_config))
}

/// Exit code from the first item of a wait stream. Anything that is not a
/// reported container status counts as failure (1).
fn wait_exit_code(next: Option<Result<ContainerWaitResponse, bollard::errors::Error>>) -> i64 {
    match next {
        Some(Ok(response)) => response.status_code,
        // Non-zero exits arrive as an error carrying the code
        Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => code,
        Some(Err(e)) => {
            tracing::warn!("Wait error: {}", e);
            1
        }
        None => {
            tracing::warn!("Wait stream ended without a container status");
            1
        }
    }
}
