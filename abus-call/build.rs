//! Stamps the git revision and the hardware back ends compiled into
//! abus-call, reported in the startup banner and on `/health` so the build
//! running on a device can be told apart from the outside.

use std::process::Command;

/// Cargo features that select a hardware back end
const BACKENDS: &[&str] = &["cpal-audio"];

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let enabled: Vec<&str> = BACKENDS
        .iter()
        .copied()
        .filter(|feature| {
            let var = format!("CARGO_FEATURE_{}", feature.to_uppercase().replace('-', "_"));
            std::env::var_os(var).is_some()
        })
        .collect();
    let backends = if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(",")
    };

    println!("cargo:rustc-env=ABUS_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=ABUS_BACKENDS={}", backends);
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
