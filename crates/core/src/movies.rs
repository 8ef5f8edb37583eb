//! Movie capping and movie/link restriction
//!
//! The capped movie set is the single source of truth for referential
//! closure: ratings, tags, movies and links are all restricted to it.

use ahash::AHashSet;
use lensprep_filters::TextSanitizer;
use lensprep_formats::{Link, Movie, MovieId, Rating};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Final set of retained movie ids
#[derive(Debug, Clone, Default)]
pub struct MovieSelection {
    retained: BTreeSet<MovieId>,
    /// Rated movies that have no row in the movies table
    orphaned: BTreeSet<MovieId>,
    /// Catalogued movies removed by the cap
    capped: usize,
}

impl MovieSelection {
    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.retained.contains(&movie_id)
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Retained ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.retained.iter().copied()
    }

    pub fn orphaned(&self) -> &BTreeSet<MovieId> {
        &self.orphaned
    }

    pub fn capped(&self) -> usize {
        self.capped
    }
}

/// Outcome of re-filtering ratings against the final movie set
#[derive(Debug, Clone, Default)]
pub struct Refiltered {
    pub ratings: Vec<Rating>,
    pub dropped_by_cap: usize,
    pub dropped_orphans: usize,
}

/// Bound the movie universe to `max_movies` ids, lowest first.
///
/// Ids absent from `catalog` are set aside before capping so they neither
/// take a slot nor reach the output.
pub fn cap_movies(
    universe: &BTreeSet<MovieId>,
    catalog: &[Movie],
    max_movies: Option<usize>,
) -> MovieSelection {
    let known: AHashSet<MovieId> = catalog.iter().map(|m| m.movie_id).collect();
    let (catalogued, orphaned): (BTreeSet<MovieId>, BTreeSet<MovieId>) =
        universe.iter().partition(|&&id| known.contains(&id));

    if !orphaned.is_empty() {
        warn!(
            "{} rated movies have no entry in the movies table and will be dropped",
            orphaned.len()
        );
    }

    let max_movies = max_movies.filter(|&n| n > 0);
    let retained: BTreeSet<MovieId> = match max_movies {
        Some(cap) if catalogued.len() > cap => catalogued.iter().copied().take(cap).collect(),
        _ => catalogued.clone(),
    };
    let capped = catalogued.len() - retained.len();

    debug!(
        "Movie cap kept {} of {} catalogued movies (cap: {:?})",
        retained.len(),
        catalogued.len(),
        max_movies
    );

    MovieSelection {
        retained,
        orphaned,
        capped,
    }
}

/// Drop ratings whose movie is not retained. Filter only, no re-truncation.
pub fn refilter_ratings(ratings: Vec<Rating>, selection: &MovieSelection) -> Refiltered {
    let mut out = Refiltered {
        ratings: Vec::with_capacity(ratings.len()),
        ..Default::default()
    };

    for rating in ratings {
        if selection.contains(rating.movie_id) {
            out.ratings.push(rating);
        } else if selection.orphaned.contains(&rating.movie_id) {
            out.dropped_orphans += 1;
        } else {
            out.dropped_by_cap += 1;
        }
    }

    out
}

/// Movies restricted to the selection, with title and genres sanitized.
///
/// Returns the kept movies and how many text fields the sanitizer changed.
pub fn select_movies(
    movies: Vec<Movie>,
    selection: &MovieSelection,
    sanitizer: &TextSanitizer,
) -> (Vec<Movie>, usize) {
    let mut sanitized = 0;
    let kept: Vec<Movie> = movies
        .into_iter()
        .filter(|m| selection.contains(m.movie_id))
        .map(|mut movie| {
            sanitized += usize::from(sanitizer.sanitize_in_place(&mut movie.title));
            sanitized += usize::from(sanitizer.sanitize_in_place(&mut movie.genres));
            movie
        })
        .collect();

    (kept, sanitized)
}

/// Links restricted to the selection when `restrict` is set, otherwise unchanged
pub fn select_links(links: Vec<Link>, selection: &MovieSelection, restrict: bool) -> Vec<Link> {
    if !restrict {
        return links;
    }
    links
        .into_iter()
        .filter(|l| selection.contains(l.movie_id))
        .collect()
}
