use std::process::Command;

use anyhow::{Context, Result};

/// Workspace crates, leaf first
const CRATES: &[&str] = &["bqstream-domain", "bqstream-core", "bqstream-infra"];

/// Check each crate on its own so workspace feature unification cannot hide
/// a missing dependency feature.
pub fn check_each_crate() -> Result<()> {
    println!("Checking {} crates in isolation...", CRATES.len());

    for (index, name) in CRATES.iter().enumerate() {
        println!("\n[{}/{}] cargo check -p {name} --all-targets", index + 1, CRATES.len());

        let status = Command::new("cargo")
            .args(["check", "-p", name, "--all-targets"])
            .status()
            .with_context(|| format!("Failed to run cargo check for '{name}'"))?;

        if !status.success() {
            anyhow::bail!("Crate '{name}' failed to compile on its own");
        }

        println!("✅ {name} compiles on its own");
    }

    println!("\n✅ All {} crates compile in isolation!", CRATES.len());

    Ok(())
}
