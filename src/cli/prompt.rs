//! Interactive prompts on stdin/stdout

use std::io::{self, BufRead, Write};

use tabauth_core::error::TabAuthError;

/// Prompt for a required value with default
pub fn prompt_required(prompt: &str, default: &str) -> Result<String, TabAuthError> {
    let prompt_text = if default.is_empty() {
        format!("{}: ", prompt)
    } else {
        format!("{} [{}]: ", prompt, default)
    };

    loop {
        let input = prompt_input(&prompt_text)?;

        if input.trim().is_empty() {
            if !default.is_empty() {
                return Ok(default.to_string());
            }
            println!("❌ This field is required. Please enter a value.");
            continue;
        }

        return Ok(input.trim().to_string());
    }
}

/// Prompt for an optional value
pub fn prompt_optional(prompt: &str, default: &str) -> Result<String, TabAuthError> {
    let prompt_text = format!("{} [{}]: ", prompt, default);
    let input = prompt_input(&prompt_text)?;

    if input.trim().is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.trim().to_string())
    }
}

/// Prompt for yes/no with default
pub fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool, TabAuthError> {
    let default_indicator = if default_yes { "[Y/n]" } else { "[y/N]" };
    let prompt_text = format!("{} {}: ", prompt, default_indicator);

    loop {
        let input = prompt_input(&prompt_text)?.to_lowercase();

        match input.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => return Ok(default_yes),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no.");
                continue;
            }
        }
    }
}

/// Low-level input prompting
pub fn prompt_input(prompt: &str) -> Result<String, TabAuthError> {
    print!("{}", prompt);
    io::stdout().flush()?;

    read_answer(&mut io::stdin().lock())
}

/// Read one line, failing once input is exhausted so prompts cannot spin
fn read_answer<R: BufRead>(reader: &mut R) -> Result<String, TabAuthError> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        let closed = io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before an answer");
        return Err(closed.into());
    }

    Ok(input.trim_end().to_string())
}
