use crate::{
    MAX_LIMIT,
    aggregate::{Aggregate, Vote},
    error::Result,
};
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;
use vastrayl_types::UserId;

/// Latest vote of one user for one item, keyed by `(item_id, user_id)`.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct RatingSubmission {
    pub item_id: i64,
    pub user_id: String,
    pub rating_value: f64,
    pub flag: bool,
    pub submitted_at: OffsetDateTime,
}

impl RatingSubmission {
    pub fn vote(&self) -> Vote {
        Vote::new(self.rating_value, self.flag)
    }
}

pub type SubmissionRepository = SubmissionRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct SubmissionRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SubmissionRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn find(&self, item_id: i64, user: &UserId) -> Result<Option<RatingSubmission>> {
        find(item_id, user, &self.executor).await
    }

    pub async fn get(&self, item_id: i64, user: &UserId) -> Result<RatingSubmission> {
        self.find(item_id, user)
            .await?
            .ok_or_else(|| crate::Error::not_found(format!("Rating of item {item_id} by {user}")))
    }

    pub async fn list_for_item(&self, item_id: i64) -> Result<Vec<RatingSubmission>> {
        let records = sqlx::query_as::<_, RatingSubmission>(
            "SELECT * FROM rating_submission WHERE item_id = ? ORDER BY submitted_at DESC LIMIT ?",
        )
        .bind(item_id)
        .bind(MAX_LIMIT as i64)
        .fetch_all(&self.executor)
        .await?;
        Ok(records)
    }

    /// Aggregate computed from scratch over all submissions of the item.
    /// Used to audit the incrementally maintained values.
    pub async fn tally(&self, item_id: i64) -> Result<Aggregate> {
        let (average_rating, ratings_count, flags_count): (f64, i64, i64) = sqlx::query_as(
            "SELECT COALESCE(AVG(rating_value), 0.0), COUNT(*), COALESCE(SUM(flag), 0)
            FROM rating_submission WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&self.executor)
        .await?;
        Ok(Aggregate {
            average_rating,
            ratings_count,
            flags_count,
        })
    }
}

pub(crate) async fn find<'c, E>(
    item_id: i64,
    user: &UserId,
    executor: E,
) -> Result<Option<RatingSubmission>>
where
    E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    let record = sqlx::query_as::<_, RatingSubmission>(
        "SELECT * FROM rating_submission WHERE item_id = ? AND user_id = ?",
    )
    .bind(item_id)
    .bind(user.as_ref())
    .fetch_optional(executor)
    .await?;
    Ok(record)
}

pub(crate) async fn upsert<'c, E>(
    item_id: i64,
    user: &UserId,
    vote: Vote,
    submitted_at: OffsetDateTime,
    executor: E,
) -> Result<()>
where
    E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    sqlx::query(
        "INSERT INTO rating_submission (item_id, user_id, rating_value, flag, submitted_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (item_id, user_id) DO UPDATE SET
        rating_value = excluded.rating_value, flag = excluded.flag, submitted_at = excluded.submitted_at",
    )
    .bind(item_id)
    .bind(user.as_ref())
    .bind(vote.rating)
    .bind(vote.flag)
    .bind(submitted_at)
    .execute(executor)
    .await?;
    Ok(())
}
