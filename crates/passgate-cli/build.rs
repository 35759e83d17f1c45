//! Stamps the binary with its package version and, when built from a git
//! checkout, the short commit it was built from.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let package = env!("CARGO_PKG_VERSION");
    let version = match short_commit() {
        Some(commit) => format!("{package} ({commit})"),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=PASSGATE_VERSION={version}");
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;

    let commit = String::from_utf8(output.stdout).ok()?;
    let commit = commit.trim();
    (!commit.is_empty()).then(|| commit.to_string())
}
