//! Row-level filters for dataset cleaning
//!
//! This crate provides the text sanitizer applied to free-text columns and
//! the order-preserving per-key truncation used to cap grouped rows.

pub mod error;
pub mod text_sanitizer;
pub mod truncate;

pub use error::{Error, Result};
pub use text_sanitizer::{AsciiStrategy, TextSanitizer};
pub use truncate::{truncate_per_key, PerKeyCap};
