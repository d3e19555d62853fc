//! # Output
//!
//! Every command result goes through [`emit`]: pretty JSON with `--json`,
//! otherwise the command's own plain-text rendering.

use optica_core::Money;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::Context;

/// Prints `value` as JSON or through `render`.
pub fn emit<T, F>(ctx: &Context, value: &T, render: F) -> AppResult<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T),
{
    if ctx.json {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::internal(format!("Cannot encode output: {}", e)))?;
        println!("{}", text);
    } else {
        render(value);
    }
    Ok(())
}

/// Writes an error as JSON on stderr.
pub fn print_json_error(err: &AppError) {
    match serde_json::to_string(err) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("{}", err),
    }
}

/// `$45.990`
pub fn pesos(amount: i64) -> String {
    Money::from_pesos(amount).to_string()
}

/// Cuts `text` to `width` characters, marking the cut with `…`.
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit() {
        assert_eq!(fit("Ana", 10), "Ana");
        assert_eq!(fit("Armazón Aviator", 8), "Armazón…");
        assert_eq!(fit("Armazón Aviator", 8).chars().count(), 8);
    }

    #[test]
    fn test_pesos() {
        assert_eq!(pesos(45_990), "$45.990");
    }
}
