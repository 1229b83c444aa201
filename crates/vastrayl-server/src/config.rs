use std::{path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use vastrayl_app::state::AppConfig;
use vastrayl_dal::rating::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use vastrayl_types::config::BackendConfig;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "VASTRAYL_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "VASTRAYL_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "VASTRAYL_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Default token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(
        long,
        env = "VASTRAYL_DEFAULT_PAGE_SIZE",
        default_value = "100",
        help = "Default page size"
    )]
    pub default_page_size: u32,

    #[arg(
        long,
        env = "VASTRAYL_RATING_MAX_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        help = "How many times a rating is retried on concurrent modification of the item before reporting conflict"
    )]
    pub rating_max_attempts: u32,

    #[arg(
        long,
        env = "VASTRAYL_RATING_BACKOFF",
        default_value = "5ms",
        help = "Base delay between rating retries",
        value_parser = humantime::parse_duration
    )]
    pub rating_backoff: Duration,

    #[arg(
        long,
        env = "VASTRAYL_RATING_TIMEOUT",
        help = "Give up on a rating submission after this time (e.g. 2s), no limit by default",
        value_parser = humantime::parse_duration
    )]
    pub rating_timeout: Option<Duration>,

    #[arg(long, env = "VASTRAYL_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.backend.data_dir()
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            default_page_size: config.default_page_size,
            rating_timeout: config.rating_timeout,
            retry: RetryPolicy::new(config.rating_max_attempts, config.rating_backoff),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = ServerConfig::try_parse_from([
            "vastrayl-server",
            "--data-dir",
            "/tmp/vastrayl-server-test",
            "--port",
            "4000",
            "--rating-max-attempts",
            "3",
            "--rating-timeout",
            "2s",
        ])
        .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.token_validity, Duration::from_secs(24 * 3600));
        assert_eq!(
            config.database_url(),
            "sqlite:///tmp/vastrayl-server-test/vastrayl.db"
        );

        let app_config = AppConfig::from(&config);
        assert_eq!(app_config.retry.max_attempts, 3);
        assert_eq!(app_config.retry.backoff, Duration::from_millis(5));
        assert_eq!(app_config.rating_timeout, Some(Duration::from_secs(2)));
        assert_eq!(app_config.default_page_size, 100);
    }
}
