//! Running statistics kept on every rateable item.
//!
//! The aggregate is maintained incrementally: a new vote is folded in using only
//! the current aggregate and the voter's previous vote (if any), never by
//! rescanning all submissions. One user contributes at most one rating sample
//! and at most one flag, so repeated votes replace rather than accumulate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Aggregate {
    pub average_rating: f64,
    pub ratings_count: i64,
    pub flags_count: i64,
}

/// Latest rating and flag of one user for one item.
///
/// Rating and flag are independent: a flag-only vote still carries a rating,
/// and a rating of 0 is a real sample that pulls the average down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub rating: f64,
    pub flag: bool,
}

impl Vote {
    pub fn new(rating: f64, flag: bool) -> Self {
        Self { rating, flag }
    }
}

impl Aggregate {
    pub const EMPTY: Aggregate = Aggregate {
        average_rating: 0.0,
        ratings_count: 0,
        flags_count: 0,
    };

    pub fn sum(&self) -> f64 {
        self.average_rating * self.ratings_count as f64
    }

    /// Folds `vote` into the aggregate. `prior` is the same user's previous
    /// vote for this item, `None` on their first vote.
    pub fn apply(&self, prior: Option<Vote>, vote: Vote) -> Aggregate {
        let old_sum = self.sum();
        let (new_sum, ratings_count) = match prior {
            Some(prior) => (old_sum - prior.rating + vote.rating, self.ratings_count),
            None => (old_sum + vote.rating, self.ratings_count + 1),
        };
        let average_rating = if ratings_count > 0 {
            new_sum / ratings_count as f64
        } else {
            0.0
        };

        let flags_count = match prior {
            Some(prior) if prior.flag != vote.flag => {
                if vote.flag {
                    self.flags_count + 1
                } else {
                    (self.flags_count - 1).max(0)
                }
            }
            None if vote.flag => self.flags_count + 1,
            _ => self.flags_count,
        };

        Aggregate {
            average_rating,
            ratings_count,
            flags_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    /// Replays votes the way the store does: remembers each user's last vote.
    fn replay(votes: &[(u8, Vote)]) -> (Aggregate, HashMap<u8, Vote>) {
        let mut latest: HashMap<u8, Vote> = HashMap::new();
        let mut agg = Aggregate::EMPTY;
        for (user, vote) in votes {
            agg = agg.apply(latest.get(user).copied(), *vote);
            latest.insert(*user, *vote);
        }
        (agg, latest)
    }

    #[test]
    fn test_first_rating() {
        let agg = Aggregate::EMPTY.apply(None, Vote::new(8.0, false));
        assert_eq!(agg.average_rating, 8.0);
        assert_eq!(agg.ratings_count, 1);
        assert_eq!(agg.flags_count, 0);
    }

    #[test]
    fn test_rerating_replaces_sample() {
        let (agg, _) = replay(&[
            (1, Vote::new(8.0, false)),
            (2, Vote::new(4.0, false)),
        ]);
        assert_eq!(agg.average_rating, 6.0);
        assert_eq!(agg.ratings_count, 2);

        let agg = agg.apply(Some(Vote::new(8.0, false)), Vote::new(10.0, false));
        assert_eq!(agg.average_rating, 7.0);
        assert_eq!(agg.ratings_count, 2);
    }

    #[test]
    fn test_flag_toggle() {
        let first = Vote::new(0.0, true);
        let agg = Aggregate::EMPTY.apply(None, first);
        assert_eq!(agg.flags_count, 1);
        assert_eq!(agg.ratings_count, 1);
        assert_eq!(agg.average_rating, 0.0);

        let agg = agg.apply(Some(first), Vote::new(0.0, true));
        assert_eq!(agg.flags_count, 1);

        let agg = agg.apply(Some(first), Vote::new(0.0, false));
        assert_eq!(agg.flags_count, 0);
        assert_eq!(agg.ratings_count, 1);
    }

    #[test]
    fn test_unflag_never_goes_negative() {
        let agg = Aggregate {
            average_rating: 3.0,
            ratings_count: 1,
            flags_count: 0,
        };
        let agg = agg.apply(Some(Vote::new(3.0, true)), Vote::new(3.0, false));
        assert_eq!(agg.flags_count, 0);
    }

    #[test]
    fn test_zero_rating_dilutes_average() {
        let (agg, _) = replay(&[(1, Vote::new(10.0, false)), (2, Vote::new(0.0, true))]);
        assert_eq!(agg.average_rating, 5.0);
        assert_eq!(agg.ratings_count, 2);
        assert_eq!(agg.flags_count, 1);
    }

    #[derive(Debug, Clone)]
    struct Votes(Vec<(u8, Vote)>);

    impl Arbitrary for Votes {
        fn arbitrary(g: &mut Gen) -> Self {
            let len = usize::arbitrary(g) % 200;
            let votes = (0..len)
                .map(|_| {
                    let user = u8::arbitrary(g) % 12;
                    // quarter steps on a 0-10 scale, as entered in the rating slider
                    let rating = (u8::arbitrary(g) % 41) as f64 / 4.0;
                    (user, Vote::new(rating, bool::arbitrary(g)))
                })
                .collect();
            Votes(votes)
        }
    }

    #[quickcheck]
    fn prop_aggregate_matches_latest_votes(votes: Votes) -> bool {
        let (agg, latest) = replay(&votes.0);
        let expected_sum: f64 = latest.values().map(|v| v.rating).sum();
        let expected_flags = latest.values().filter(|v| v.flag).count() as i64;

        agg.ratings_count == latest.len() as i64
            && agg.flags_count == expected_flags
            && (agg.sum() - expected_sum).abs() < 1e-6
            && (latest.is_empty() || agg.average_rating >= -1e-9)
    }
}
