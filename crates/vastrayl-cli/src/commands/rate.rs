use clap::Parser;
use vastrayl_dal::rating::{RatingAggregator, RetryPolicy, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
use vastrayl_types::{config::BackendConfig, UserId};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct RateCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Id of the rated item")]
    pub item: i64,
    #[arg(short, long, help = "Id of the rating user")]
    pub user: UserId,
    #[arg(short, long, help = "Rating value, between 0 and the item's max rating")]
    pub rating: f64,
    #[arg(short, long, help = "Flag the item")]
    pub flag: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, help = "Attempts on concurrent modification")]
    pub max_attempts: u32,
}

impl Executor for RateCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = super::open_pool(&self.backend).await?;
        let aggregator =
            RatingAggregator::with_policy(pool, RetryPolicy::new(self.max_attempts, DEFAULT_BACKOFF));
        let outcome = aggregator
            .submit_rating(self.item, &self.user, self.rating, self.flag)
            .await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        Ok(())
    }
}
