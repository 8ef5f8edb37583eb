//! Tag filtering: retained users and movies, per-movie cap, sanitized text

use crate::movies::MovieSelection;
use crate::users::UserSample;
use lensprep_filters::{truncate_per_key, TextSanitizer};
use lensprep_formats::Tag;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TagSelection {
    pub tags: Vec<Tag>,
    pub dropped_by_user: usize,
    pub dropped_by_movie: usize,
    pub dropped_by_cap: usize,
    /// Tag texts changed by the sanitizer
    pub sanitized: usize,
}

pub fn filter_tags(
    tags: Vec<Tag>,
    users: &UserSample,
    movies: &MovieSelection,
    max_per_movie: Option<usize>,
    sanitizer: &TextSanitizer,
) -> TagSelection {
    let mut selection = TagSelection::default();

    let mut referenced = Vec::with_capacity(tags.len());
    for tag in tags {
        if !users.contains(tag.user_id) {
            selection.dropped_by_user += 1;
        } else if !movies.contains(tag.movie_id) {
            selection.dropped_by_movie += 1;
        } else {
            referenced.push(tag);
        }
    }

    let (mut kept, dropped_by_cap) = truncate_per_key(referenced, max_per_movie, |t| t.movie_id);
    selection.dropped_by_cap = dropped_by_cap;

    for tag in &mut kept {
        selection.sanitized += usize::from(sanitizer.sanitize_in_place(&mut tag.tag));
    }
    selection.tags = kept;

    debug!(
        "Tag filter kept {} ({} outside sample, {} on dropped movies, {} over per-movie cap, {} sanitized)",
        selection.tags.len(),
        selection.dropped_by_user,
        selection.dropped_by_movie,
        selection.dropped_by_cap,
        selection.sanitized
    );

    selection
}
