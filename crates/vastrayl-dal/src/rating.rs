//! Rating submission with per item optimistic concurrency.
//!
//! Each call reads the item aggregate and the caller's previous vote, computes
//! the new aggregate and writes both records in one transaction. The aggregate
//! update is guarded by the item `version`: if another submission committed in
//! between, no row matches, the transaction is rolled back and the whole
//! read-compute-write cycle starts again. Every submission bumps the version, so
//! a stale previous vote is detected the same way as a stale aggregate.
//!
//! Submissions for different items never touch the same row and proceed
//! independently.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use vastrayl_types::UserId;

use crate::{
    Error, Pool,
    aggregate::{Aggregate, Vote},
    error::Result,
    submission,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one, at least 1
    pub max_attempts: u32,
    /// Base delay before a retry, grows linearly with the attempt number
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let jitter_limit = self.backoff.as_micros() as u64;
        let jitter = if jitter_limit > 0 {
            Duration::from_micros(rand::random_range(0..jitter_limit))
        } else {
            Duration::ZERO
        };
        self.backoff * attempt + jitter
    }
}

/// State of an item and of one user's vote as read at the start of a submission.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub item_id: i64,
    pub version: i64,
    pub max_rating: f64,
    pub aggregate: Aggregate,
    pub prior: Option<Vote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingOutcome {
    pub item_id: i64,
    pub new_average: f64,
    pub new_count: i64,
    pub new_flag_count: i64,
    pub version: i64,
}

pub fn validate_rating(value: f64, max: f64) -> Result<()> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidRating { value, max })
    }
}

#[derive(Clone)]
pub struct RatingAggregator {
    pool: Pool,
    policy: RetryPolicy,
}

impl RatingAggregator {
    pub fn new(pool: Pool) -> Self {
        Self::with_policy(pool, RetryPolicy::default())
    }

    pub fn with_policy(pool: Pool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn snapshot(&self, item_id: i64, user: &UserId) -> Result<Snapshot> {
        let (version, max_rating, average_rating, ratings_count, flags_count): (
            i64,
            f64,
            f64,
            i64,
            i64,
        ) = sqlx::query_as(
            "SELECT version, max_rating, average_rating, ratings_count, flags_count
            FROM rateable_item WHERE id = ?",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found(format!("Item {item_id}")))?;

        let prior = submission::find(item_id, user, &self.pool)
            .await?
            .map(|s| s.vote());

        Ok(Snapshot {
            item_id,
            version,
            max_rating,
            aggregate: Aggregate {
                average_rating,
                ratings_count,
                flags_count,
            },
            prior,
        })
    }

    /// Writes `vote` on top of `snapshot`. Fails with [`Error::FailedUpdate`]
    /// and leaves everything untouched if the item changed since the snapshot.
    pub async fn commit(
        &self,
        snapshot: &Snapshot,
        user: &UserId,
        vote: Vote,
    ) -> Result<RatingOutcome> {
        validate_rating(vote.rating, snapshot.max_rating)?;
        let aggregate = snapshot.aggregate.apply(snapshot.prior, vote);
        let now = OffsetDateTime::now_utc();
        let new_version = snapshot.version + 1;

        let mut transaction = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE rateable_item SET average_rating = ?, ratings_count = ?, flags_count = ?, version = ?, modified = ?
            WHERE id = ? AND version = ?",
        )
        .bind(aggregate.average_rating)
        .bind(aggregate.ratings_count)
        .bind(aggregate.flags_count)
        .bind(new_version)
        .bind(now)
        .bind(snapshot.item_id)
        .bind(snapshot.version)
        .execute(&mut *transaction)
        .await?;

        if result.rows_affected() == 0 {
            // dropping the transaction rolls it back
            return Err(Error::FailedUpdate {
                id: snapshot.item_id,
                version: snapshot.version,
            });
        }

        submission::upsert(snapshot.item_id, user, vote, now, &mut *transaction).await?;
        transaction.commit().await?;

        Ok(RatingOutcome {
            item_id: snapshot.item_id,
            new_average: aggregate.average_rating,
            new_count: aggregate.ratings_count,
            new_flag_count: aggregate.flags_count,
            version: new_version,
        })
    }

    /// Records `user`'s rating and flag for the item and returns the updated
    /// aggregate. Re-submitting replaces the user's previous vote.
    #[instrument(skip(self), level = "debug")]
    pub async fn submit_rating(
        &self,
        item_id: i64,
        user: &UserId,
        rating: f64,
        flag: bool,
    ) -> Result<RatingOutcome> {
        self.submit(item_id, user, Vote::new(rating, flag), None)
            .await
    }

    /// As [`RatingAggregator::submit_rating`], but gives up with
    /// [`Error::Timeout`] once `timeout` elapses.
    ///
    /// The deadline bounds reads and retry delays only. A write that has
    /// started always runs to its end, so `Timeout` means nothing was stored.
    #[instrument(skip(self), level = "debug")]
    pub async fn submit_rating_with_timeout(
        &self,
        item_id: i64,
        user: &UserId,
        rating: f64,
        flag: bool,
        timeout: Duration,
    ) -> Result<RatingOutcome> {
        let deadline = Instant::now() + timeout;
        self.submit(item_id, user, Vote::new(rating, flag), Some(deadline))
            .await
    }

    async fn submit(
        &self,
        item_id: i64,
        user: &UserId,
        vote: Vote,
        deadline: Option<Instant>,
    ) -> Result<RatingOutcome> {
        let mut attempt = 1;
        loop {
            let snapshot = until(deadline, self.snapshot(item_id, user)).await?;
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!("Deadline for rating of item {item_id} passed before write");
                return Err(Error::Timeout);
            }
            match self.commit(&snapshot, user, vote).await {
                Err(Error::FailedUpdate { version, .. }) => {
                    if attempt >= self.policy.max_attempts {
                        warn!(
                            "Giving up rating of item {item_id} after {attempt} attempts, last seen version {version}"
                        );
                        return Err(Error::Conflict {
                            id: item_id,
                            attempts: attempt,
                        });
                    }
                    debug!("Item {item_id} changed since version {version}, retrying");
                    let delay = self.policy.delay(attempt);
                    until(deadline, async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Runs `fut` to completion or fails with [`Error::Timeout`] at `deadline`.
/// Only for futures that write nothing.
async fn until<T>(
    deadline: Option<Instant>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| Error::Timeout)?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(0.0, 10.0).is_ok());
        assert!(validate_rating(10.0, 10.0).is_ok());
        assert!(validate_rating(4.5, 5.0).is_ok());
        assert!(matches!(
            validate_rating(5.5, 5.0),
            Err(Error::InvalidRating { max, .. }) if max == 5.0
        ));
        assert!(validate_rating(-0.1, 10.0).is_err());
        assert!(validate_rating(f64::NAN, 10.0).is_err());
        assert!(validate_rating(f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn test_retry_delay_grows() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        let first = policy.delay(1);
        assert!(first >= Duration::from_millis(10) && first < Duration::from_millis(20));
        let third = policy.delay(3);
        assert!(third >= Duration::from_millis(30) && third < Duration::from_millis(40));

        let no_backoff = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(no_backoff.delay(2), Duration::ZERO);
    }
}
