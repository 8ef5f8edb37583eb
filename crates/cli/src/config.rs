//! Layered run configuration
//!
//! Settings are merged from lowest to highest precedence: built-in
//! defaults, an optional YAML/TOML file, the environment, then CLI flags.
//! The merged result is validated once into a [`RunSettings`].

use anyhow::{Context, Result};
use clap::Args;
use lensprep_core::config::{
    cap_from_signed, parse_cap, parse_flag, ASCII_ONLY, MAX_MOVIES, MAX_RATINGS_PER_USER,
    MAX_TAGS_PER_MOVIE, MAX_USERS,
};
use lensprep_core::FilterConfig;
use lensprep_filters::AsciiStrategy;
use lensprep_formats::{DatasetPaths, OutputPaths, Table, DEFAULT_SUFFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file contents; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub limits: LimitsConfig,
    pub text: TextConfig,
    pub links: LinksConfig,
}

/// Input locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding ratings.csv, movies.csv, tags.csv and links.csv
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PathBuf>,
}

/// Output location and naming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Defaults to the input data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Caps; zero means no cap, negative values are rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_users: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_movies: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ratings_per_user: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tags_per_movie: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascii_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascii_strategy: Option<AsciiStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Drop links whose movie was not retained (default true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict: Option<bool>,
}

/// Flags shared by `run` and `config`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Config file with pipeline settings (YAML or TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing the raw MovieLens tables
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Ratings table (overrides <data-dir>/ratings.csv)
    #[arg(long)]
    pub ratings: Option<PathBuf>,

    /// Movies table (overrides <data-dir>/movies.csv)
    #[arg(long)]
    pub movies: Option<PathBuf>,

    /// Tags table (overrides <data-dir>/tags.csv)
    #[arg(long)]
    pub tags: Option<PathBuf>,

    /// Links table (overrides <data-dir>/links.csv)
    #[arg(long)]
    pub links: Option<PathBuf>,

    /// Directory for the filtered tables (defaults to the data directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Suffix appended to each output file stem
    #[arg(long)]
    pub suffix: Option<String>,

    /// Keep users with userId up to this value (0 = all)
    #[arg(long, allow_negative_numbers = true)]
    pub max_users: Option<i64>,

    /// Keep at most this many distinct movies, lowest ids first (0 = all)
    #[arg(long, allow_negative_numbers = true)]
    pub max_movies: Option<i64>,

    /// Keep at most this many ratings per user, in file order (0 = all)
    #[arg(long, allow_negative_numbers = true)]
    pub max_ratings_per_user: Option<i64>,

    /// Keep at most this many tags per movie, in file order (0 = all)
    #[arg(long, allow_negative_numbers = true)]
    pub max_tags_per_movie: Option<i64>,

    /// Restrict titles, genres and tags to printable ASCII
    #[arg(long)]
    pub ascii_only: bool,

    /// How non-ASCII text is reduced: transliterate or strip
    #[arg(long, value_name = "STRATEGY")]
    pub ascii_strategy: Option<AsciiStrategy>,

    /// Write every link, not only those of retained movies
    #[arg(long)]
    pub keep_all_links: bool,
}

impl PipelineConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            _ => Err(anyhow::anyhow!(
                "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                extension
            )),
        }
    }

    /// Save configuration to a file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let content = match extension {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "toml" => toml::to_string_pretty(self)?,
            _ => {
                return Err(anyhow::anyhow!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                    extension
                ))
            }
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Overlay option values from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay option values from `lookup`.
    ///
    /// An empty or zero cap clears any cap set by the file.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let caps = [
            (MAX_USERS, &mut self.limits.max_users),
            (MAX_MOVIES, &mut self.limits.max_movies),
            (MAX_RATINGS_PER_USER, &mut self.limits.max_ratings_per_user),
            (MAX_TAGS_PER_MOVIE, &mut self.limits.max_tags_per_movie),
        ];
        for (name, slot) in caps {
            if let Some(raw) = lookup(name) {
                let cap = parse_cap(name, &raw)
                    .with_context(|| format!("Invalid environment variable {}", name))?;
                *slot = cap.map(|n| n as i64);
            }
        }

        if let Some(raw) = lookup(ASCII_ONLY) {
            let flag = parse_flag(ASCII_ONLY, &raw)
                .with_context(|| format!("Invalid environment variable {}", ASCII_ONLY))?;
            self.text.ascii_only = Some(flag);
        }

        Ok(())
    }

    /// Overlay values given on the command line
    pub fn apply_args(&mut self, args: &ConfigArgs) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        set(&mut self.input.data_dir, &args.data_dir);
        set(&mut self.input.ratings, &args.ratings);
        set(&mut self.input.movies, &args.movies);
        set(&mut self.input.tags, &args.tags);
        set(&mut self.input.links, &args.links);
        set(&mut self.output.dir, &args.output_dir);
        set(&mut self.output.suffix, &args.suffix);
        set(&mut self.limits.max_users, &args.max_users);
        set(&mut self.limits.max_movies, &args.max_movies);
        set(&mut self.limits.max_ratings_per_user, &args.max_ratings_per_user);
        set(&mut self.limits.max_tags_per_movie, &args.max_tags_per_movie);
        set(&mut self.text.ascii_strategy, &args.ascii_strategy);

        if args.ascii_only {
            self.text.ascii_only = Some(true);
        }
        if args.keep_all_links {
            self.links.restrict = Some(false);
        }
    }

    /// Validate and resolve into concrete settings
    pub fn resolve(&self) -> Result<RunSettings> {
        let cap = |name: &str, value: Option<i64>| -> Result<Option<usize>> {
            match value {
                Some(v) => Ok(cap_from_signed(name, v)?),
                None => Ok(None),
            }
        };

        let filter = FilterConfig {
            max_users: cap(MAX_USERS, self.limits.max_users)?,
            max_movies: cap(MAX_MOVIES, self.limits.max_movies)?,
            max_ratings_per_user: cap(MAX_RATINGS_PER_USER, self.limits.max_ratings_per_user)?,
            max_tags_per_movie: cap(MAX_TAGS_PER_MOVIE, self.limits.max_tags_per_movie)?,
            ascii_only: self.text.ascii_only.unwrap_or(false),
            ascii_strategy: self.text.ascii_strategy.unwrap_or_default(),
            restrict_links: self.links.restrict.unwrap_or(true),
        };

        let data_dir = self
            .input
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let mut inputs = DatasetPaths::in_dir(&data_dir);
        let overrides = [
            (&mut inputs.ratings, &self.input.ratings),
            (&mut inputs.movies, &self.input.movies),
            (&mut inputs.tags, &self.input.tags),
            (&mut inputs.links, &self.input.links),
        ];
        for (slot, path) in overrides {
            if let Some(path) = path {
                slot.clone_from(path);
            }
        }

        let suffix = self
            .output
            .suffix
            .clone()
            .unwrap_or_else(|| DEFAULT_SUFFIX.to_string());
        if suffix.is_empty() {
            anyhow::bail!("Output suffix must not be empty");
        }
        if suffix.contains(['/', '\\']) {
            anyhow::bail!("Output suffix must not contain path separators: {:?}", suffix);
        }
        let output_dir = self.output.dir.clone().unwrap_or_else(|| data_dir.clone());
        let outputs = OutputPaths::in_dir(&output_dir, &suffix);

        for output in Table::ALL.map(|t| outputs.get(t)) {
            if let Some(table) = Table::ALL.into_iter().find(|&t| inputs.get(t) == output) {
                anyhow::bail!(
                    "Output {} would overwrite the {} input table",
                    output.display(),
                    table
                );
            }
        }

        Ok(RunSettings {
            inputs,
            outputs,
            filter,
        })
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSettings {
    pub inputs: DatasetPaths,
    pub outputs: OutputPaths,
    pub filter: FilterConfig,
}

/// Merge every configuration layer and validate the result
pub fn load_settings(args: &ConfigArgs) -> Result<RunSettings> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env()?;
    config.apply_args(args);
    config.resolve()
}
