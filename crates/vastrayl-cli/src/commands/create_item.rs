use clap::Parser;
use garde::Validate as _;
use vastrayl_dal::item::{CreateItem, ItemRepository};
use vastrayl_types::{config::BackendConfig, UserId};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct CreateItemCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Title of the item")]
    pub title: String,
    #[arg(short, long, help = "Id of the owning user")]
    pub owner: UserId,
    #[arg(short, long, help = "Contest the item is entered in")]
    pub contest: Option<i64>,
    #[arg(long, help = "Top of the rating scale, default 10")]
    pub max_rating: Option<f64>,
    #[arg(long, help = "URL of the outfit image")]
    pub image_url: Option<String>,
}

impl Executor for CreateItemCmd {
    async fn run(self) -> anyhow::Result<()> {
        let payload = CreateItem {
            title: self.title,
            contest_id: self.contest,
            image_url: self.image_url,
            max_rating: self.max_rating,
        };
        payload.validate()?;
        let pool = super::open_pool(&self.backend).await?;
        let repository = ItemRepository::new(pool);
        let item = repository.create(&self.owner, payload).await?;
        println!("{}", serde_json::to_string_pretty(&item)?);
        Ok(())
    }
}
