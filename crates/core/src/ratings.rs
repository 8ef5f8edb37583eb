//! Ratings filtering: sampled users, per-user cap, movie universe

use crate::users::UserSample;
use lensprep_filters::truncate_per_key;
use lensprep_formats::{MovieId, Rating};
use std::collections::BTreeSet;
use tracing::debug;

/// Ratings surviving the user filter and per-user cap
#[derive(Debug, Clone, Default)]
pub struct RatingsSelection {
    pub ratings: Vec<Rating>,
    /// Distinct movie ids among `ratings`
    pub universe: BTreeSet<MovieId>,
    pub dropped_by_user: usize,
    pub dropped_by_cap: usize,
}

/// Keep ratings of sampled users, at most `max_per_user` each in input order
pub fn filter_ratings(
    ratings: Vec<Rating>,
    users: &UserSample,
    max_per_user: Option<usize>,
) -> RatingsSelection {
    let total = ratings.len();
    let sampled: Vec<Rating> = ratings
        .into_iter()
        .filter(|r| users.contains(r.user_id))
        .collect();
    let dropped_by_user = total - sampled.len();

    let (ratings, dropped_by_cap) = truncate_per_key(sampled, max_per_user, |r| r.user_id);
    let universe: BTreeSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();

    debug!(
        "Ratings filter kept {} ({} outside sample, {} over per-user cap), {} distinct movies",
        ratings.len(),
        dropped_by_user,
        dropped_by_cap,
        universe.len()
    );

    RatingsSelection {
        ratings,
        universe,
        dropped_by_user,
        dropped_by_cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::sample_users;
    use lensprep_formats::{HalfStars, UserId};

    fn rating(user_id: UserId, movie_id: MovieId, rating: &str, timestamp: i64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: HalfStars::parse(rating).unwrap(),
            timestamp,
        }
    }

    #[test]
    fn test_user_ceiling_excludes_other_users() {
        let ratings = vec![
            rating(1, 10, "4.0", 100),
            rating(1, 20, "3.5", 101),
            rating(2, 10, "5.0", 102),
        ];
        let users = sample_users(&ratings, &[], Some(1));
        let selection = filter_ratings(ratings, &users, None);

        assert_eq!(
            selection.ratings,
            vec![rating(1, 10, "4.0", 100), rating(1, 20, "3.5", 101)]
        );
        assert_eq!(selection.dropped_by_user, 1);
        assert_eq!(selection.universe, BTreeSet::from([10, 20]));
    }

    #[test]
    fn test_per_user_cap_keeps_first_seen() {
        let ratings = vec![rating(1, 10, "1.0", 100), rating(1, 20, "5.0", 101)];
        let users = sample_users(&ratings, &[], None);
        let selection = filter_ratings(ratings, &users, Some(1));

        assert_eq!(selection.ratings, vec![rating(1, 10, "1.0", 100)]);
        assert_eq!(selection.dropped_by_cap, 1);
        assert_eq!(selection.universe, BTreeSet::from([10]));
    }

    #[test]
    fn test_cap_counts_only_sampled_ratings() {
        // user 3's ratings must not consume user 1's budget
        let ratings = vec![
            rating(3, 30, "2.0", 1),
            rating(1, 10, "4.0", 2),
            rating(1, 11, "4.0", 3),
            rating(1, 12, "4.0", 4),
        ];
        let users = sample_users(&ratings, &[], Some(2));
        let selection = filter_ratings(ratings, &users, Some(2));

        assert_eq!(selection.ratings.len(), 2);
        assert_eq!(selection.dropped_by_user, 1);
        assert_eq!(selection.dropped_by_cap, 1);
    }
}
