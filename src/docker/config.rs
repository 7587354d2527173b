use crate::gpu::image::DeviceAccess;

/// Everything needed to start the LocalAI container, independent of whether
/// it is started through the CLI or the Engine API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub name: String,
    /// HOST:CONTAINER, passed through uninterpreted by the CLI backend
    pub port_mapping: String,
    pub image: String,
    pub access: DeviceAccess,
    pub interactive: bool,
}
