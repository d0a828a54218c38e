use anyhow::Result;
use colored::Colorize;

use crate::cargo::{step, OnFailure};
use crate::DRIVER;

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let mut args = vec![
        "doc",
        "-p",
        DRIVER,
        "--no-deps",
        "--features",
        "std,tracing",
    ];
    if open {
        args.push("--open");
    }

    step("Building dotstar docs", &args, OnFailure::Abort)?;

    if !open {
        println!(
            "   {}",
            "Open target/doc/dotstar/index.html in your browser".dimmed()
        );
        println!(
            "   {}",
            "Or run 'cargo run -p xtask -- doc --open'".dimmed()
        );
    }

    println!();

    Ok(())
}
