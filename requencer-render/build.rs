//! Embeds build identification into the `requencer` binary
//!
//! Exposes `REQUENCER_GIT_REV`, `REQUENCER_BUILD_TIME` and
//! `REQUENCER_BUILD_PROFILE` to `env!()` for `--version` output.

use std::process::Command;

/// Short revision with a `-dirty` suffix for uncommitted changes
fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?;
    Some(rev.trim().to_string()).filter(|r| !r.is_empty())
}

fn main() {
    let revision = git_revision().unwrap_or_else(|| "unknown".to_string());
    let built_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=REQUENCER_GIT_REV={}", revision);
    println!("cargo:rustc-env=REQUENCER_BUILD_TIME={}", built_at);
    println!("cargo:rustc-env=REQUENCER_BUILD_PROFILE={}", profile);
}
