use clap::Parser;
use vastrayl_dal::item::ItemRepository;
use vastrayl_types::config::BackendConfig;

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct LeaderboardCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Contest id")]
    pub contest: i64,
    #[arg(
        short,
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(i64).range(1..=vastrayl_dal::MAX_LIMIT as i64),
        help = "Number of entries to show"
    )]
    pub limit: i64,
    #[arg(long, default_value_t = 0, help = "Skip entries with fewer ratings")]
    pub min_ratings: i64,
}

impl Executor for LeaderboardCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = super::open_pool(&self.backend).await?;
        let repository = ItemRepository::new(pool);
        let entries = repository
            .leaderboard(self.contest, self.min_ratings, self.limit)
            .await?;
        if entries.is_empty() {
            println!("No entries in contest {}", self.contest);
        }
        for (rank, item) in entries.iter().enumerate() {
            println!(
                "{:>3}. {:<40} {:>5.2} ({} ratings, {} flags) #{}",
                rank + 1,
                item.title,
                item.average_rating,
                item.ratings_count,
                item.flags_count,
                item.id
            );
        }
        Ok(())
    }
}
