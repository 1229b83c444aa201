use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use vastrayl_auth::token::TokenManager;
use vastrayl_types::{claim::ApiClaim, config::BackendConfig, UserId};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct IssueTokenCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User id the token is issued for")]
    pub user: UserId,
    #[arg(
        long,
        default_value = "1 day",
        help = "Token validity in human friendly format (e.g. 1d, 1h)",
        value_parser = humantime::parse_duration
    )]
    pub validity: Duration,
}

impl Executor for IssueTokenCmd {
    async fn run(self) -> anyhow::Result<()> {
        let secret_path = self.backend.secret_path();
        let secret = tokio::fs::read(&secret_path).await.with_context(|| {
            format!(
                "Cannot read token secret {}, start the server once to create it",
                secret_path.display()
            )
        })?;
        let tokens = TokenManager::new(&secret, self.validity)?;
        let token = tokens.issue(ApiClaim::new_expired(self.user.to_string()))?;
        println!("{token}");
        Ok(())
    }
}
