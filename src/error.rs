use thiserror::Error;

/// Hardware that was detected but cannot be accelerated. These never fall
/// back to the CPU image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Unsupported CUDA version: {0}")]
    UnsupportedCudaVersion(String),

    #[error("Intel GPU detected but `clinfo` is not installed. Install clinfo to query its compute capabilities.")]
    IntelProbeMissing,

    #[error("Intel GPU detected but it reports neither FP16 nor FP32 compute support")]
    IntelPrecisionUnsupported,
}
