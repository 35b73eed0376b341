use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::layout::page::PageSize;

/// Application configuration loaded from environment variables.
/// Every variable is optional; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Inputs longer than this many characters are rejected before normalization.
    pub max_input_chars: usize,
    pub page_size: PageSize,
    /// JSON style sheet that replaces (or adds to) the built-in sheets.
    pub style_sheet_path: Option<PathBuf>,
    /// Render both formats and compare their text on every render request.
    pub verify_parity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            max_input_chars: 60_000,
            page_size: PageSize::Letter,
            style_sheet_path: None,
            verify_parity: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_input_chars: env_or("MAX_INPUT_CHARS", defaults.max_input_chars)?,
            page_size: env_or("PAGE_SIZE", defaults.page_size)?,
            style_sheet_path: std::env::var("STYLE_SHEET_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            verify_parity: env_or("VERIFY_PARITY", defaults.verify_parity)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Environment variable '{key}' is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default_and_parse() {
        assert_eq!(env_or("RESUME_PRESS_TEST_UNSET_VAR", 42usize).unwrap(), 42);

        std::env::set_var("RESUME_PRESS_TEST_PAGE", "a4");
        assert_eq!(
            env_or("RESUME_PRESS_TEST_PAGE", PageSize::Letter).unwrap(),
            PageSize::A4
        );

        std::env::set_var("RESUME_PRESS_TEST_PORT", "not-a-port");
        assert!(env_or("RESUME_PRESS_TEST_PORT", 8080u16).is_err());
    }
}
