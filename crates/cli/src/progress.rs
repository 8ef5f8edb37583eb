//! Progress reporting and summaries for the CLI

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use lensprep_core::PipelineStats;
use lensprep_formats::{Table, WrittenTable};

/// Spinner shown while tables are loaded, filtered and written
pub struct ProgressReporter {
    bar: ProgressBar,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a spinner; a hidden one when `enabled` is false
    pub fn new(enabled: bool) -> Result<Self> {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} [{elapsed_precise}] {msg}")?,
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };

        Ok(Self {
            bar,
            start_time: Instant::now(),
        })
    }

    /// Report rows read so far from `table`
    pub fn loading(&self, table: Table, rows: usize) {
        self.bar
            .set_message(format!("Loading {}: {} rows", table, format_number(rows)));
    }

    /// Report the current stage
    pub fn stage(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Print a formatted summary report
pub fn print_summary_report(
    data_dir: &Path,
    stats: &PipelineStats,
    written: &[WrittenTable],
    elapsed: Duration,
) {
    println!("\n{}", "═".repeat(60));
    println!("MovieLens Filtering Complete");
    println!("{}", "═".repeat(60));
    println!("Input:              {}", data_dir.display());

    if written.is_empty() {
        println!("Output:             (dry run - no output written)");
    }
    for table in written {
        println!("Output:             {}", table.path.display());
    }

    println!(
        "Users:              {} of {} retained",
        format_with_commas(stats.users_retained),
        format_with_commas(stats.users_observed)
    );

    let tables = [
        ("Ratings", stats.raw_ratings, stats.ratings),
        ("Movies", stats.raw_movies, stats.movies),
        ("Tags", stats.raw_tags, stats.tags),
        ("Links", stats.raw_links, stats.links),
    ];
    for (name, raw, kept) in tables {
        println!(
            "{:<20}{} of {} ({:.1}%)",
            format!("{}:", name),
            format_with_commas(kept),
            format_with_commas(raw),
            percent(kept, raw)
        );
    }

    if stats.ratings_dropped_orphan > 0 {
        println!(
            "Orphan ratings:     {} (movie not in movies table)",
            format_with_commas(stats.ratings_dropped_orphan)
        );
    }
    if stats.fields_sanitized > 0 {
        println!(
            "Text sanitized:     {} fields",
            format_with_commas(stats.fields_sanitized)
        );
    }

    println!(
        "Final dataset:      {} rows ({:.1}%) in {:.2}s",
        format_with_commas(stats.output_rows()),
        stats.retention_rate(),
        elapsed.as_secs_f64()
    );

    println!("{}", "═".repeat(60));
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Format large numbers compactly
fn format_number(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format number with thousand separators
pub fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
