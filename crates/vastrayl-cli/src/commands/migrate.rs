use clap::Parser;
use tracing::info;
use vastrayl_types::config::BackendConfig;

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct MigrateCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for MigrateCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = super::open_pool(&self.backend).await?;
        pool.close().await;
        info!("Database {} is up to date", self.backend.database_url());
        Ok(())
    }
}
