//! Validated pipeline configuration
//!
//! Raw option values (environment strings, config file integers, CLI
//! flags) are checked once here and turned into a [`FilterConfig`] whose
//! caps are plain `Option<usize>`: `None` means no cap.

use crate::{Error, Result};
use lensprep_filters::{AsciiStrategy, TextSanitizer};
use serde::{Deserialize, Serialize};

/// Option names, as recognised in the environment
pub const MAX_USERS: &str = "MAX_USERS";
pub const MAX_MOVIES: &str = "MAX_MOVIES";
pub const MAX_RATINGS_PER_USER: &str = "MAX_RATINGS_PER_USER";
pub const MAX_TAGS_PER_MOVIE: &str = "MAX_TAGS_PER_MOVIE";
pub const ASCII_ONLY: &str = "ASCII_ONLY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Highest userId kept
    pub max_users: Option<usize>,
    /// Number of distinct movies kept, lowest ids first
    pub max_movies: Option<usize>,
    pub max_ratings_per_user: Option<usize>,
    pub max_tags_per_movie: Option<usize>,
    pub ascii_only: bool,
    pub ascii_strategy: AsciiStrategy,
    /// Drop links whose movie was not retained
    pub restrict_links: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_users: None,
            max_movies: None,
            max_ratings_per_user: None,
            max_tags_per_movie: None,
            ascii_only: false,
            ascii_strategy: AsciiStrategy::default(),
            restrict_links: true,
        }
    }
}

impl FilterConfig {
    pub fn sanitizer(&self) -> TextSanitizer {
        TextSanitizer::new(self.ascii_only, self.ascii_strategy)
    }
}

/// Validate a signed cap: negative is an error, zero means no cap
pub fn cap_from_signed(option: &str, value: i64) -> Result<Option<usize>> {
    if value < 0 {
        return Err(Error::Configuration(format!(
            "{} must be a non-negative integer, got {}",
            option, value
        )));
    }

    let value = usize::try_from(value)
        .map_err(|_| Error::Configuration(format!("{} is too large: {}", option, value)))?;
    Ok((value > 0).then_some(value))
}

/// Parse a cap from text; blank text means unset
pub fn parse_cap(option: &str, raw: &str) -> Result<Option<usize>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value: i64 = raw.parse().map_err(|_| {
        Error::Configuration(format!("{} must be an integer, got '{}'", option, raw))
    })?;
    cap_from_signed(option, value)
}

/// Parse a boolean option (`true/false`, `1/0`, `yes/no`, `on/off`)
pub fn parse_flag(option: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Configuration(format!(
            "{} must be a boolean, got '{}'",
            option, other
        ))),
    }
}

/// Parse an ASCII strategy name
pub fn parse_strategy(raw: &str) -> Result<AsciiStrategy> {
    Ok(raw.parse::<AsciiStrategy>()?)
}
