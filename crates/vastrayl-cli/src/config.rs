use clap::{Parser, Subcommand};

use crate::commands::{
    create_item::CreateItemCmd, issue_token::IssueTokenCmd, leaderboard::LeaderboardCmd,
    migrate::MigrateCmd, rate::RateCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for vastrayl - manage rateable items and ratings directly in the backend database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Migrate(MigrateCmd),
    CreateItem(CreateItemCmd),
    Rate(RateCmd),
    Leaderboard(LeaderboardCmd),
    IssueToken(IssueTokenCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Migrate(cmd) => cmd.run().await,
            Command::CreateItem(cmd) => cmd.run().await,
            Command::Rate(cmd) => cmd.run().await,
            Command::Leaderboard(cmd) => cmd.run().await,
            Command::IssueToken(cmd) => cmd.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        let config = CliConfig::try_parse_from([
            "vastrayl-cli",
            "rate",
            "--data-dir",
            "/tmp/vastrayl-cli-test",
            "--item",
            "3",
            "--user",
            "alice",
            "--rating",
            "7.5",
            "--flag",
        ])
        .unwrap();
        match config.command {
            Command::Rate(cmd) => {
                assert_eq!(cmd.item, 3);
                assert_eq!(cmd.user.as_ref(), "alice");
                assert_eq!(cmd.rating, 7.5);
                assert!(cmd.flag);
            }
            _ => panic!("Expected rate command"),
        }
    }

    #[test]
    fn test_invalid_user_rejected() {
        let res = CliConfig::try_parse_from([
            "vastrayl-cli",
            "issue-token",
            "--data-dir",
            "/tmp/vastrayl-cli-test",
            "--user",
            "  ",
        ]);
        assert!(res.is_err());
    }
}
