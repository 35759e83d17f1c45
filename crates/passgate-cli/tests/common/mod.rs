use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI binary against `api_url` with an isolated data directory.
pub fn run_cli(args: &[&str], data_dir: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_passgate"));
    cmd.args(args);
    cmd.env("PASSGATE_DATA_DIR", data_dir);
    cmd.env("PASSGATE_API_URL", api_url);
    cmd.env_remove("PASSGATE_APP");
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], data_dir: &Path, api_url: &str) -> String {
    let output = run_cli(args, data_dir, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], data_dir: &Path, api_url: &str) -> String {
    let output = run_cli(args, data_dir, api_url);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}
