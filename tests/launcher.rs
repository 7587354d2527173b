#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

const SMI_CUDA_12: &str = "| NVIDIA-SMI 535.104.05   Driver Version: 535.104.05   CUDA Version: 12.2     |";
const SMI_CUDA_11: &str = "| NVIDIA-SMI 470.199.02   Driver Version: 470.199.02   CUDA Version: 11.4     |";
const LSPCI_AMD: &str = "0a:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 21";
const LSPCI_INTEL: &str = "00:02.0 VGA compatible controller: Intel Corporation UHD Graphics 630";

/// A temp directory standing in for PATH, holding fake host tools
struct FakeHost {
    bin: TempDir,
}

impl FakeHost {
    fn new() -> Self {
        let host = Self {
            bin: tempfile::tempdir().unwrap(),
        };
        // The fake runtime echoes its arguments so tests can inspect them
        host.script("docker", "echo \"docker $*\"");
        host
    }

    fn script(&self, name: &str, body: &str) -> &Self {
        let path = self.bin.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    fn tool_printing(&self, name: &str, output: &str) -> &Self {
        self.script(name, &format!("printf '%s\\n' '{}'", output))
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("localai-launcher").unwrap();
        cmd.env("PATH", self.bin.path())
            .env("LOCALAI_LAUNCHER_CONFIG", self.bin.path().join("no-settings.yaml"))
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .env_remove("RUST_LOG");
        cmd
    }

    fn path(&self) -> &Path {
        self.bin.path()
    }
}

#[test]
fn no_gpu_launches_cpu_image_without_prompt() {
    let host = FakeHost::new();
    host.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("No GPU detected"))
        .stdout(predicate::str::contains(
            "docker run -it --name local-ai -p 8080:8080 localai/localai:latest-aio-cpu",
        ))
        .stdout(predicate::str::contains("[y/n]").not());
}

#[test]
fn name_and_port_overrides_reach_the_command() {
    let host = FakeHost::new();
    host.cmd()
        .args(["--name", "foo", "-p", "9090:8080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--name foo -p 9090:8080"));
}

#[test]
fn unknown_flag_fails_without_launch() {
    let host = FakeHost::new();
    host.cmd()
        .args(["--name", "foo", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--bogus"))
        .stderr(predicate::str::contains("--help"))
        .stdout(predicate::str::contains("docker run").not());
}

#[test]
fn help_exits_zero_without_launch() {
    let host = FakeHost::new();
    host.cmd()
        .args(["--name", "foo", "-p", "1:1", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("docker run").not());
}

#[test]
fn cuda_12_image() {
    let host = FakeHost::new();
    host.tool_printing("nvidia-smi", SMI_CUDA_12);
    host.cmd()
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("NVIDIA GPU detected"))
        .stdout(predicate::str::contains(
            "--gpus all localai/localai:latest-aio-gpu-nvidia-cuda-12",
        ));
}

#[test]
fn cuda_11_image() {
    let host = FakeHost::new();
    host.tool_printing("nvidia-smi", SMI_CUDA_11);
    host.cmd()
        .write_stdin("Y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("latest-aio-gpu-nvidia-cuda-11"));
}

#[test]
fn unsupported_cuda_fails_without_launch() {
    for version in ["10.2", "x"] {
        let host = FakeHost::new();
        host.tool_printing("nvidia-smi", &format!("CUDA Version: {}", version));
        host.cmd()
            .write_stdin("y\n")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unsupported CUDA version"))
            .stdout(predicate::str::contains("docker run").not());
    }
}

#[test]
fn amd_gets_rocm_devices() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_AMD);
    host.cmd()
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--device /dev/kfd --device /dev/dri --group-add video localai/localai:latest-aio-gpu-hipblas",
        ));
}

#[test]
fn declined_acceleration_uses_cpu_image() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_AMD);
    host.cmd()
        .write_stdin("maybe\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid answer 'maybe'"))
        .stdout(predicate::str::contains("localai/localai:latest-aio-cpu"))
        .stdout(predicate::str::contains("/dev/kfd").not());
}

#[test]
fn intel_fp16_image() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_INTEL)
        .tool_printing("clinfo", "  Half-precision Floating-point support  (cl_khr_fp16)");
    host.cmd()
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--device /dev/dri localai/localai:latest-aio-gpu-intel-f16",
        ));
}

#[test]
fn intel_without_precision_fails() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_INTEL)
        .tool_printing("clinfo", "Number of platforms  0");
    host.cmd()
        .write_stdin("y\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("neither FP16 nor FP32"))
        .stdout(predicate::str::contains("docker run").not());
}

#[test]
fn intel_without_clinfo_fails() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_INTEL);
    host.cmd()
        .write_stdin("y\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("clinfo"));
}

#[test]
fn closed_stdin_at_prompt_fails() {
    let host = FakeHost::new();
    host.tool_printing("lspci", LSPCI_AMD);
    host.cmd()
        .write_stdin("")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("docker run").not());
}

#[test]
fn runtime_exit_status_is_propagated() {
    let host = FakeHost::new();
    host.script("docker", "echo \"docker: container name in use\" >&2\nexit 125");
    host.cmd()
        .assert()
        .code(125)
        .stderr(predicate::str::contains("container name in use"));
}

#[test]
fn dry_run_prints_without_running() {
    let host = FakeHost::new();
    host.script("docker", "exit 7");
    host.tool_printing("nvidia-smi", SMI_CUDA_12);
    host.cmd()
        .args(["--dry-run", "--yes", "--name", "my ai"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "docker run -it --name 'my ai' -p 8080:8080 --gpus all localai/localai:latest-aio-gpu-nvidia-cuda-12",
        ));
}

#[test]
fn settings_file_changes_runtime_and_repository() {
    let host = FakeHost::new();
    host.script("podman", "echo \"podman $*\"");
    let settings = host.path().join("launcher.yaml");
    std::fs::write(&settings, "runtime: podman\nrepository: quay.io/go-skynet/local-ai\n").unwrap();
    host.cmd()
        .env("LOCALAI_LAUNCHER_CONFIG", &settings)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "podman run -it --name local-ai -p 8080:8080 quay.io/go-skynet/local-ai:latest-aio-cpu",
        ));
}

#[test]
fn missing_runtime_is_an_error() {
    let host = FakeHost::new();
    std::fs::remove_file(host.path().join("docker")).unwrap();
    host.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to run 'docker'"));
}
