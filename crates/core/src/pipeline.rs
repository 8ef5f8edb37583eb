//! Filtering pipeline
//!
//! Runs the stages in dependency order over a fully loaded dataset:
//! user sampling, ratings filtering, movie capping with a ratings
//! re-filter, tag filtering, then movie and link restriction. Each stage
//! consumes the previous stage's output and returns a new collection.

use crate::config::FilterConfig;
use crate::movies::{cap_movies, refilter_ratings, select_links, select_movies};
use crate::ratings::filter_ratings;
use crate::tags::filter_tags;
use crate::users::{sample_users, UserSample};
use crate::Result;
use lensprep_filters::AsciiStrategy;
use lensprep_formats::{
    load_dataset, write_dataset, Dataset, DatasetPaths, OutputPaths, WrittenTable,
};
use serde::Serialize;
use tracing::info;

/// Pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub raw_ratings: usize,
    pub raw_movies: usize,
    pub raw_tags: usize,
    pub raw_links: usize,

    pub users_observed: usize,
    pub users_retained: usize,

    pub ratings_dropped_by_user: usize,
    pub ratings_dropped_by_user_cap: usize,
    pub ratings_dropped_by_movie_cap: usize,
    pub ratings_dropped_orphan: usize,

    pub movie_universe: usize,
    pub movies_orphaned: usize,
    pub movies_retained: usize,

    pub tags_dropped_by_user: usize,
    pub tags_dropped_by_movie: usize,
    pub tags_dropped_by_movie_cap: usize,

    pub fields_sanitized: usize,

    pub ratings: usize,
    pub movies: usize,
    pub tags: usize,
    pub links: usize,
}

impl PipelineStats {
    pub fn raw_rows(&self) -> usize {
        self.raw_ratings + self.raw_movies + self.raw_tags + self.raw_links
    }

    pub fn output_rows(&self) -> usize {
        self.ratings + self.movies + self.tags + self.links
    }

    pub fn retention_rate(&self) -> f64 {
        if self.raw_rows() > 0 {
            (self.output_rows() as f64 / self.raw_rows() as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Filtered dataset plus what it took to get there
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dataset: Dataset,
    pub users: UserSample,
    pub stats: PipelineStats,
}

/// The MovieLens filtering pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: FilterConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every stage over `raw`
    pub fn run(&self, raw: Dataset) -> PipelineOutput {
        let config = &self.config;
        let sanitizer = config.sanitizer();
        let mut stats = PipelineStats {
            raw_ratings: raw.ratings.len(),
            raw_movies: raw.movies.len(),
            raw_tags: raw.tags.len(),
            raw_links: raw.links.len(),
            ..Default::default()
        };

        let Dataset {
            ratings,
            movies,
            tags,
            links,
        } = raw;

        let users = sample_users(&ratings, &tags, config.max_users);
        stats.users_observed = users.observed();
        stats.users_retained = users.len();
        info!(
            "Users: {} of {} retained",
            stats.users_retained, stats.users_observed
        );

        let rated = filter_ratings(ratings, &users, config.max_ratings_per_user);
        stats.ratings_dropped_by_user = rated.dropped_by_user;
        stats.ratings_dropped_by_user_cap = rated.dropped_by_cap;
        stats.movie_universe = rated.universe.len();

        let selection = cap_movies(&rated.universe, &movies, config.max_movies);
        stats.movies_orphaned = selection.orphaned().len();
        stats.movies_retained = selection.len();
        info!(
            "Movies: {} retained from a universe of {}",
            stats.movies_retained, stats.movie_universe
        );

        let refiltered = refilter_ratings(rated.ratings, &selection);
        stats.ratings_dropped_by_movie_cap = refiltered.dropped_by_cap;
        stats.ratings_dropped_orphan = refiltered.dropped_orphans;
        info!(
            "Ratings: {} kept of {}",
            refiltered.ratings.len(),
            stats.raw_ratings
        );

        let tagged = filter_tags(
            tags,
            &users,
            &selection,
            config.max_tags_per_movie,
            &sanitizer,
        );
        stats.tags_dropped_by_user = tagged.dropped_by_user;
        stats.tags_dropped_by_movie = tagged.dropped_by_movie;
        stats.tags_dropped_by_movie_cap = tagged.dropped_by_cap;
        info!("Tags: {} kept of {}", tagged.tags.len(), stats.raw_tags);

        let (movies, movie_fields_sanitized) = select_movies(movies, &selection, &sanitizer);
        let links = select_links(links, &selection, config.restrict_links);
        stats.fields_sanitized = tagged.sanitized + movie_fields_sanitized;

        let dataset = Dataset {
            ratings: refiltered.ratings,
            movies,
            tags: tagged.tags,
            links,
        };
        stats.ratings = dataset.ratings.len();
        stats.movies = dataset.movies.len();
        stats.tags = dataset.tags.len();
        stats.links = dataset.links.len();

        if config.ascii_only {
            info!(
                "Sanitized {} text fields ({})",
                stats.fields_sanitized, config.ascii_strategy
            );
        }

        PipelineOutput {
            dataset,
            users,
            stats,
        }
    }

    /// Load inputs, run, and write outputs (skipped when `outputs` is `None`)
    pub fn execute(
        &self,
        inputs: &DatasetPaths,
        outputs: Option<&OutputPaths>,
    ) -> Result<(PipelineOutput, Vec<WrittenTable>)> {
        let raw = load_dataset(inputs)?;
        let output = self.run(raw);
        let written = match outputs {
            Some(paths) => write_dataset(&output.dataset, paths)?,
            None => Vec::new(),
        };
        Ok((output, written))
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: FilterConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: FilterConfig::default(),
        }
    }

    pub fn max_users(mut self, max: usize) -> Self {
        self.config.max_users = Some(max);
        self
    }

    pub fn max_movies(mut self, max: usize) -> Self {
        self.config.max_movies = Some(max);
        self
    }

    pub fn max_ratings_per_user(mut self, max: usize) -> Self {
        self.config.max_ratings_per_user = Some(max);
        self
    }

    pub fn max_tags_per_movie(mut self, max: usize) -> Self {
        self.config.max_tags_per_movie = Some(max);
        self
    }

    pub fn ascii_only(mut self, strategy: AsciiStrategy) -> Self {
        self.config.ascii_only = true;
        self.config.ascii_strategy = strategy;
        self
    }

    pub fn restrict_links(mut self, restrict: bool) -> Self {
        self.config.restrict_links = restrict;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.config)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
