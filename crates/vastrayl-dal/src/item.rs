use crate::{Batch, ListingParams, MAX_LIMIT, aggregate::Aggregate, error::Result};
use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;
use tracing::debug;
use vastrayl_types::UserId;

pub const DEFAULT_MAX_RATING: f64 = 10.0;

const VALID_ORDER_FIELDS: &[&str] = &[
    "id",
    "created",
    "modified",
    "title",
    "average_rating",
    "ratings_count",
    "flags_count",
];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateItem {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(range(min = 0))]
    pub contest_id: Option<i64>,
    #[garde(length(min = 1, max = 1023))]
    pub image_url: Option<String>,
    #[garde(range(min = 1.0, max = 100.0))]
    pub max_rating: Option<f64>,
}

/// An outfit post or contest entry together with its rating aggregate.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct RateableItem {
    pub id: i64,
    pub title: String,
    pub owner_id: String,
    pub contest_id: Option<i64>,
    pub image_url: Option<String>,
    pub max_rating: f64,
    pub average_rating: f64,
    pub ratings_count: i64,
    pub flags_count: i64,
    pub version: i64,
    pub created: OffsetDateTime,
    pub modified: OffsetDateTime,
}

impl RateableItem {
    pub fn aggregate(&self) -> Aggregate {
        Aggregate {
            average_rating: self.average_rating,
            ratings_count: self.ratings_count,
            flags_count: self.flags_count,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == user.as_ref()
    }
}

pub type ItemRepository = ItemRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct ItemRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ItemRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, owner: &UserId, payload: CreateItem) -> Result<RateableItem> {
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            "INSERT INTO rateable_item (title, owner_id, contest_id, image_url, max_rating, version, created, modified)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&payload.title)
        .bind(owner.as_ref())
        .bind(payload.contest_id)
        .bind(&payload.image_url)
        .bind(payload.max_rating.unwrap_or(DEFAULT_MAX_RATING))
        .bind(now)
        .bind(now)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created item {id} for {owner}");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<RateableItem> {
        sqlx::query_as::<_, RateableItem>("SELECT * FROM rateable_item WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| crate::Error::not_found(format!("Item {id}")))
    }

    pub async fn count(&self, contest_id: Option<i64>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM rateable_item WHERE (? IS NULL OR contest_id = ?)",
        )
        .bind(contest_id)
        .bind(contest_id)
        .fetch_one(&self.executor)
        .await?;
        Ok(count as u64)
    }

    pub async fn list(
        &self,
        params: ListingParams,
        contest_id: Option<i64>,
    ) -> Result<Batch<RateableItem>> {
        let order = match params.ordering(VALID_ORDER_FIELDS)? {
            o if o.is_empty() => "id".to_string(),
            o => o,
        };
        let sql = format!(
            "SELECT * FROM rateable_item WHERE (? IS NULL OR contest_id = ?) ORDER BY {order} LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, RateableItem>(&sql)
            .bind(contest_id)
            .bind(contest_id)
            .bind(params.limit)
            .bind(params.offset)
            .fetch(&self.executor)
            .take(MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;
        let total = self.count(contest_id).await?;
        Ok(Batch {
            offset: params.offset,
            total,
            rows,
        })
    }

    /// Contest entries ranked by average rating, ties broken by number of
    /// ratings and then by age of the entry.
    pub async fn leaderboard(
        &self,
        contest_id: i64,
        min_ratings: i64,
        limit: i64,
    ) -> Result<Vec<RateableItem>> {
        let records = sqlx::query_as::<_, RateableItem>(
            "SELECT * FROM rateable_item WHERE contest_id = ? AND ratings_count >= ?
            ORDER BY average_rating DESC, ratings_count DESC, id ASC LIMIT ?",
        )
        .bind(contest_id)
        .bind(min_ratings)
        .bind(limit.clamp(0, MAX_LIMIT as i64))
        .fetch_all(&self.executor)
        .await?;
        Ok(records)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM rateable_item WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(crate::Error::not_found(format!("Item {id}")))
        } else {
            Ok(())
        }
    }
}
