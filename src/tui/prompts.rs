//! Terminal prompts and status lines

use crate::error::Result;
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

/// Prompt for yes/no confirmation with a default value
pub fn confirm(message: &str, default: bool) -> Result<bool> {
    let result = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()?;
    Ok(result)
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("{} {}", "→".cyan(), message);
}
