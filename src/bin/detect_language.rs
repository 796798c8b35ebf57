//! Detect the language of text from the command line.
//!
//! Usage:
//!   detect-language "안녕하세요"        # detect the arguments joined by spaces
//!   cat messages.txt | detect-language  # detect each stdin line
//!
//! Output: `code<TAB>supported<TAB>text` per input.

use alma_chat::i18n::detect;
use anyhow::{Context, Result};
use std::io::{self, BufRead};

fn print_detection(text: &str) {
    let code = detect(text);
    println!("{}\t{}\t{}", code, code.is_supported(), text);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("alma_chat=warn".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        print_detection(&args.join(" "));
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        print_detection(&line);
    }

    Ok(())
}
