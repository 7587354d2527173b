use crate::error::LaunchError;
use crate::gpu::probe::{DetectedGpu, IntelPrecision};

/// Pre-built image variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    Cpu,
    Cuda12,
    Cuda11,
    Rocm,
    IntelF16,
    IntelF32,
}

/// Device access a variant needs from the container runtime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAccess {
    /// Host device nodes passed through unchanged
    pub devices: Vec<String>,
    /// Supplementary groups for the container process
    pub groups: Vec<String>,
    /// Request all NVIDIA GPUs
    pub all_gpus: bool,
}

impl ImageVariant {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Cpu => "latest-aio-cpu",
            Self::Cuda12 => "latest-aio-gpu-nvidia-cuda-12",
            Self::Cuda11 => "latest-aio-gpu-nvidia-cuda-11",
            Self::Rocm => "latest-aio-gpu-hipblas",
            Self::IntelF16 => "latest-aio-gpu-intel-f16",
            Self::IntelF32 => "latest-aio-gpu-intel-f32",
        }
    }

    pub fn device_access(self) -> DeviceAccess {
        match self {
            Self::Cpu => DeviceAccess::default(),
            Self::Cuda12 | Self::Cuda11 => DeviceAccess {
                all_gpus: true,
                ..DeviceAccess::default()
            },
            Self::Rocm => DeviceAccess {
                devices: vec!["/dev/kfd".to_string(), "/dev/dri".to_string()],
                groups: vec!["video".to_string()],
                all_gpus: false,
            },
            Self::IntelF16 | Self::IntelF32 => DeviceAccess {
                devices: vec!["/dev/dri".to_string()],
                ..DeviceAccess::default()
            },
        }
    }
}

/// Pick the image variant for what was detected and what the operator chose.
/// Declining acceleration always yields the CPU image; accepting it on
/// hardware that cannot be served is an error, never a silent downgrade.
pub fn select_variant(gpu: &DetectedGpu, accelerate: bool) -> Result<ImageVariant, LaunchError> {
    if !accelerate {
        return Ok(ImageVariant::Cpu);
    }

    match gpu {
        DetectedGpu::None => Ok(ImageVariant::Cpu),
        DetectedGpu::Nvidia { cuda_major } => match cuda_major.as_deref() {
            Some("12") => Ok(ImageVariant::Cuda12),
            Some("11") => Ok(ImageVariant::Cuda11),
            Some(other) => Err(LaunchError::UnsupportedCudaVersion(other.to_string())),
            None => Err(LaunchError::UnsupportedCudaVersion("unknown".to_string())),
        },
        DetectedGpu::Amd => Ok(ImageVariant::Rocm),
        DetectedGpu::Intel { precision } => match precision {
            None => Err(LaunchError::IntelProbeMissing),
            Some(IntelPrecision::Fp16) => Ok(ImageVariant::IntelF16),
            Some(IntelPrecision::Fp32) => Ok(ImageVariant::IntelF32),
            Some(IntelPrecision::Unsupported) => Err(LaunchError::IntelPrecisionUnsupported),
        },
    }
}
