//! ASCII sanitization for free-text columns
//!
//! Titles, genres and tags are reduced to printable ASCII (0x20..=0x7E)
//! so they load cleanly into databases configured for single-byte text.
//! Structural characters (pipes, commas, quotes) are printable ASCII and
//! are kept; quoting them is the writer's job.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// How characters outside printable ASCII are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsciiStrategy {
    /// Decompose (NFKD) first so accented letters keep their base letter
    #[default]
    Transliterate,
    /// Drop every non-ASCII code point as is
    Strip,
}

impl FromStr for AsciiStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transliterate" => Ok(AsciiStrategy::Transliterate),
            "strip" => Ok(AsciiStrategy::Strip),
            other => Err(Error::InvalidConfig(format!(
                "unknown ASCII strategy '{}', expected 'transliterate' or 'strip'",
                other
            ))),
        }
    }
}

impl fmt::Display for AsciiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsciiStrategy::Transliterate => f.write_str("transliterate"),
            AsciiStrategy::Strip => f.write_str("strip"),
        }
    }
}

/// Text sanitizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSanitizer {
    /// Restrict output to printable ASCII
    pub ascii_only: bool,
    pub strategy: AsciiStrategy,
}

impl TextSanitizer {
    pub fn new(ascii_only: bool, strategy: AsciiStrategy) -> Self {
        Self {
            ascii_only,
            strategy,
        }
    }

    /// Sanitizer that leaves text untouched
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// ASCII-only sanitizer with the given strategy
    pub fn ascii(strategy: AsciiStrategy) -> Self {
        Self::new(true, strategy)
    }

    /// True if every character is in 0x20..=0x7E
    pub fn is_printable_ascii(text: &str) -> bool {
        text.bytes().all(|b| (0x20..=0x7E).contains(&b))
    }

    /// Sanitize `text`, borrowing when nothing needs to change.
    ///
    /// An owned result always differs from the input, so callers can count
    /// modified fields with `matches!(result, Cow::Owned(_))`. Text that
    /// sanitizes to nothing yields an empty string, never an error.
    pub fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.ascii_only || Self::is_printable_ascii(text) {
            return Cow::Borrowed(text);
        }

        let mut buffer = String::with_capacity(text.len());
        self.sanitize_into(text, &mut buffer);
        Cow::Owned(buffer)
    }

    /// Sanitize a field in place, returning whether it changed
    pub fn sanitize_in_place(&self, field: &mut String) -> bool {
        let cleaned = match self.sanitize(field) {
            Cow::Owned(cleaned) => Some(cleaned),
            Cow::Borrowed(_) => None,
        };
        match cleaned {
            Some(cleaned) => {
                *field = cleaned;
                true
            }
            None => false,
        }
    }

    /// Sanitize into a reusable buffer
    pub fn sanitize_into(&self, text: &str, buffer: &mut String) {
        buffer.clear();

        if !self.ascii_only {
            buffer.push_str(text);
            return;
        }

        match self.strategy {
            AsciiStrategy::Transliterate => text.nfkd().for_each(|c| push_ascii(c, buffer)),
            AsciiStrategy::Strip => text.chars().for_each(|c| push_ascii(c, buffer)),
        }
    }
}

fn push_ascii(c: char, buffer: &mut String) {
    if (' '..='~').contains(&c) {
        buffer.push(c);
    } else if c.is_whitespace() {
        buffer.push(' ');
    }
}
