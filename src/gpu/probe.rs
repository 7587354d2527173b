//! Host probes: which GPU vendor is present and what it can run.
//!
//! Detection only gathers facts and never fails. Whether those facts are
//! usable is decided by [`crate::gpu::image::select_variant`].

use regex::Regex;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

pub const NVIDIA_SMI: &str = "nvidia-smi";
pub const LSPCI: &str = "lspci";
pub const CLINFO: &str = "clinfo";

/// Access to the host tools the launcher inspects
pub trait HostProbe {
    /// Whether `tool` is on PATH and executable
    fn has_tool(&self, tool: &str) -> bool;

    /// Run `tool` and return its stdout, or None if it could not run or
    /// exited unsuccessfully
    fn run_tool(&self, tool: &str, args: &[&str]) -> Option<String>;
}

/// Probes the real host through PATH
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn has_tool(&self, tool: &str) -> bool {
        which::which(tool).is_ok()
    }

    fn run_tool(&self, tool: &str, args: &[&str]) -> Option<String> {
        let path = which::which(tool).ok()?;
        let output = match Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("Failed to run {}: {}", path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!("{} exited with {}", tool, output.status);
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Compute precision an Intel GPU reports through clinfo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntelPrecision {
    Fp16,
    Fp32,
    Unsupported,
}

/// What detection found on the host, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedGpu {
    None,
    /// `cuda_major` is the raw major token, None when it could not be read
    Nvidia { cuda_major: Option<String> },
    Amd,
    /// `precision` is None when clinfo is not installed
    Intel { precision: Option<IntelPrecision> },
}

impl DetectedGpu {
    pub fn vendor_name(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Nvidia { .. } => Some("NVIDIA"),
            Self::Amd => Some("AMD"),
            Self::Intel { .. } => Some("Intel"),
        }
    }
}

/// Probe the host: NVIDIA first, then AMD, then Intel. First match wins.
pub fn detect(probe: &dyn HostProbe) -> DetectedGpu {
    if probe.has_tool(NVIDIA_SMI) {
        let cuda_major = probe
            .run_tool(NVIDIA_SMI, &[])
            .as_deref()
            .and_then(parse_cuda_major);
        tracing::debug!("nvidia-smi present, CUDA major: {:?}", cuda_major);
        return DetectedGpu::Nvidia { cuda_major };
    }

    let listing = probe.run_tool(LSPCI, &[]).unwrap_or_default();

    if listing_has_vga(&listing, "amd/ati") {
        return DetectedGpu::Amd;
    }

    if listing_has_vga(&listing, "intel") {
        let precision = if probe.has_tool(CLINFO) {
            let report = probe.run_tool(CLINFO, &[]).unwrap_or_default();
            Some(parse_intel_precision(&report))
        } else {
            None
        };
        tracing::debug!("Intel VGA device found, precision: {:?}", precision);
        return DetectedGpu::Intel { precision };
    }

    DetectedGpu::None
}

fn cuda_version_regex() -> &'static Regex {
    static CUDA_RE: OnceLock<Regex> = OnceLock::new();
    CUDA_RE.get_or_init(|| {
        Regex::new(r"CUDA Version:\s*([^\s.|]+)").expect("CUDA_RE regex must compile")
    })
}

/// Extract the CUDA major version token from nvidia-smi output
pub fn parse_cuda_major(output: &str) -> Option<String> {
    cuda_version_regex()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a single lspci entry is a VGA device whose line mentions `vendor`.
/// Both are matched case-insensitively.
pub fn listing_has_vga(listing: &str, vendor: &str) -> bool {
    let vendor = vendor.to_lowercase();
    listing.lines().any(|line| {
        let line = line.to_lowercase();
        line.contains("vga") && line.contains(&vendor)
    })
}

/// Read clinfo output, preferring FP16 over FP32
pub fn parse_intel_precision(report: &str) -> IntelPrecision {
    let lower = report.to_lowercase();
    if lower.contains("fp16") {
        IntelPrecision::Fp16
    } else if lower.contains("fp32") || lower.contains("single-precision") {
        IntelPrecision::Fp32
    } else {
        IntelPrecision::Unsupported
    }
}
