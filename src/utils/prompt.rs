use std::io::{BufRead, Write};

use crate::config::PiConfig;
use crate::errors::PiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecisionCheck {
    Accepted(usize),
    /// Inside the hard bounds but above the soft limit.
    NeedsConfirmation(usize),
}

/// Validates a requested digit count against the configured bounds.
pub fn check_precision(digits: usize, config: &PiConfig) -> Result<PrecisionCheck, PiError> {
    if digits < config.min_digits || digits > config.max_digits {
        return Err(PiError::DegenerateInput(format!(
            "precision {} outside [{}, {}]",
            digits, config.min_digits, config.max_digits
        )));
    }
    if digits > config.soft_limit {
        Ok(PrecisionCheck::NeedsConfirmation(digits))
    } else {
        Ok(PrecisionCheck::Accepted(digits))
    }
}

/// Asks `question` and reads one answer; only "y"/"yes" counts as consent.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool, PiError> {
    write!(output, "{}", question)?;
    output.flush()?;
    let line = read_line(input)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Interactive digit-count prompt.
///
/// Empty input and values under the minimum fall back to the default; values
/// over the maximum, non-numbers and declined confirmations ask again.
pub fn read_precision<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    config: &PiConfig,
) -> Result<usize, PiError> {
    loop {
        writeln!(output, "\n{}", "=".repeat(50))?;
        writeln!(output, "Pi digit calculator")?;
        writeln!(output, "{}", "=".repeat(50))?;
        writeln!(
            output,
            "Enter the number of decimal digits to compute ({}-{}):",
            config.min_digits, config.max_digits
        )?;
        writeln!(output, "Note: more digits take longer and use more memory")?;
        write!(output, "Digits: ")?;
        output.flush()?;

        let line = read_line(input)?;
        let answer = line.trim();

        if answer.is_empty() {
            writeln!(output, "Using default: {} digits", config.default_digits)?;
            return Ok(config.default_digits);
        }

        let digits = match answer.parse::<usize>() {
            Ok(d) => d,
            Err(_) => {
                writeln!(output, "Please enter a valid number!")?;
                continue;
            }
        };

        if digits < config.min_digits {
            writeln!(
                output,
                "Digits must be at least {}, using default: {} digits",
                config.min_digits, config.default_digits
            )?;
            return Ok(config.default_digits);
        }

        match check_precision(digits, config) {
            Ok(PrecisionCheck::Accepted(d)) => return Ok(d),
            Ok(PrecisionCheck::NeedsConfirmation(d)) => {
                writeln!(
                    output,
                    "Warning: more than {} digits may make the machine unresponsive!",
                    config.soft_limit
                )?;
                if confirm(input, output, "Continue? (y/N): ")? {
                    return Ok(d);
                }
                writeln!(output, "Please enter a new value")?;
            }
            Err(_) => {
                writeln!(output, "At most {} digits are supported", config.max_digits)?;
            }
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String, PiError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PiError::Cancelled);
    }
    Ok(line)
}
