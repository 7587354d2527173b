use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Ask a y/n question until a valid answer arrives. Answers are
/// case-insensitive; anything else is rejected and the question repeated.
/// End of input is an error.
pub fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    loop {
        write!(output, "{} {} ", question, "[y/n]".bold())?;
        output.flush()?;

        // Raw bytes so a non-UTF-8 answer is rejected like any other
        let mut buf = Vec::new();
        let read = input
            .read_until(b'\n', &mut buf)
            .context("Failed to read answer from stdin")?;
        if read == 0 {
            writeln!(output)?;
            anyhow::bail!("No answer received on stdin");
        }

        let line = String::from_utf8_lossy(&buf);
        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            other => {
                writeln!(output, "{} Invalid answer '{}'. Please enter y or n.", "!".yellow().bold(), other)?;
            }
        }
    }
}
