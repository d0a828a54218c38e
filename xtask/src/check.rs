use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{step, OnFailure};
use crate::{DRIVER, EMBEDDED_TARGET};

pub fn run(host_only: bool) -> Result<()> {
    println!();
    println!("{}", "🔍 Checking dotstar builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // Check 1: no_std on the real target, plain and with defmt
    if host_only {
        println!(
            "{}",
            format!("  ⚠ Skipping {EMBEDDED_TARGET} (--host-only)").yellow()
        );
        println!();
    } else {
        step(
            &format!("Checking {EMBEDDED_TARGET} (no_std)"),
            &["check", "-p", DRIVER, "--target", EMBEDDED_TARGET],
            OnFailure::Abort,
        )?;
        step(
            &format!("Checking {EMBEDDED_TARGET} with defmt"),
            &[
                "check",
                "-p",
                DRIVER,
                "--target",
                EMBEDDED_TARGET,
                "--features",
                "defmt",
            ],
            OnFailure::Abort,
        )?;
        step(
            &format!("Checking {EMBEDDED_TARGET} with the RP2040 PIO engine"),
            &[
                "check",
                "-p",
                DRIVER,
                "--target",
                EMBEDDED_TARGET,
                "--features",
                "rp2040",
            ],
            OnFailure::Abort,
        )?;
    }

    // Check 2: host build with every host feature
    step(
        "Checking host build (std, tracing)",
        &["check", "-p", DRIVER, "--features", "std,tracing"],
        OnFailure::Abort,
    )?;

    // Check 3: Clippy lints, warnings shown but not fatal
    step(
        "Running clippy lints",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
        OnFailure::Warn,
    )?;

    // Check 4: Format check
    if step(
        "Checking code formatting",
        &["fmt", "--all", "--check"],
        OnFailure::Warn,
    )?
    .is_none()
    {
        eprintln!("     Run 'cargo fmt --all' to fix");
        println!();
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
