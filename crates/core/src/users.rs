//! User sampling by id ceiling

use ahash::AHashSet;
use lensprep_formats::{Rating, Tag, UserId};
use tracing::debug;

/// The set of retained user ids
#[derive(Debug, Clone, Default)]
pub struct UserSample {
    retained: AHashSet<UserId>,
    observed: usize,
}

impl UserSample {
    pub fn contains(&self, user_id: UserId) -> bool {
        self.retained.contains(&user_id)
    }

    /// Number of retained users
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Number of distinct users seen in ratings and tags
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Retained ids in ascending order
    pub fn sorted_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.retained.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Keep every observed user whose id is at most `max_users`.
///
/// `None` or `Some(0)` keeps all observed users.
pub fn sample_users(ratings: &[Rating], tags: &[Tag], max_users: Option<usize>) -> UserSample {
    let max_users = max_users.filter(|&n| n > 0);
    let observed: AHashSet<UserId> = ratings
        .iter()
        .map(|r| r.user_id)
        .chain(tags.iter().map(|t| t.user_id))
        .collect();

    let retained: AHashSet<UserId> = match max_users {
        Some(ceiling) => observed
            .iter()
            .copied()
            .filter(|&id| id as usize <= ceiling)
            .collect(),
        None => observed.clone(),
    };

    debug!(
        "Sampled {} of {} observed users (ceiling: {:?})",
        retained.len(),
        observed.len(),
        max_users
    );

    UserSample {
        retained,
        observed: observed.len(),
    }
}
