use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// How a failed step affects the overall task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Stop the task.
    Abort,
    /// Report and keep going.
    Warn,
}

/// Run `cargo <args>` as one reported step.
///
/// Returns the captured output when the step succeeded, `None` when it
/// failed with [`OnFailure::Warn`].
pub fn step(label: &str, args: &[&str], on_failure: OnFailure) -> Result<Option<Output>> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(Some(output));
    }

    match on_failure {
        OnFailure::Abort => {
            eprintln!("{}", format!("  ✗ {label} failed").red().bold());
            eprintln!();
            print_indented(&output);
            anyhow::bail!("{label} failed");
        }
        OnFailure::Warn => {
            eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
            eprintln!();
            print_indented(&output);
            println!();
            Ok(None)
        }
    }
}

fn print_indented(output: &Output) {
    for stream in [&output.stdout, &output.stderr] {
        for line in String::from_utf8_lossy(stream).lines() {
            eprintln!("  {line}");
        }
    }
}

/// Pull the `test result:` line out of libtest output.
pub fn test_summary(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut found = false;
    // One result line per test binary: sum them.
    for line in stdout.lines() {
        let Some(summary) = line.split("test result:").nth(1) else {
            continue;
        };
        found = true;
        for part in summary.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let count: u64 = count.parse().unwrap_or(0);
            match kind {
                "passed" => passed = passed.saturating_add(count),
                "failed" => failed = failed.saturating_add(count),
                _ => {}
            }
        }
    }
    if found {
        format!("({passed} passed, {failed} failed)")
    } else {
        "(summary not available)".to_string()
    }
}
