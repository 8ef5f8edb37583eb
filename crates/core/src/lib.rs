//! MovieLens filtering pipeline
//!
//! Subsets the ratings, movies, tags and links tables by user ceiling,
//! per-user and per-movie caps and a movie cap, while keeping every
//! rating and tag pointing at a retained user and a retained movie.

pub mod config;
pub mod error;
pub mod movies;
pub mod pipeline;
pub mod ratings;
pub mod tags;
pub mod users;

pub use config::FilterConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOutput, PipelineStats};
