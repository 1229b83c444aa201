pub mod create_item;
pub mod issue_token;
pub mod leaderboard;
pub mod migrate;
pub mod rate;

use vastrayl_dal::Pool;
use vastrayl_types::config::BackendConfig;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens the backend database with the schema brought up to date.
pub(crate) async fn open_pool(backend: &BackendConfig) -> anyhow::Result<Pool> {
    let pool = vastrayl_dal::new_pool(&backend.database_url()).await?;
    vastrayl_dal::migrate(&pool).await?;
    Ok(pool)
}
