//! Build script: embeds version information at compile time.
use std::process::Command;

fn main() {
    // Release builds pass TUCKR_VERSION explicitly; local builds describe the
    // checkout instead.
    let version = std::env::var("TUCKR_VERSION").ok().or_else(|| {
        Command::new("git")
            .args(["describe", "--tags", "--always", "--dirty"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
    });

    if let Some(version) = version {
        println!("cargo:rustc-env=TUCKR_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=TUCKR_VERSION");
}
