pub mod rest;

use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng as _;
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::debug;
use vastrayl_app::state::AppState;
use vastrayl_server::{
    build_state,
    config::{Parser, ServerConfig},
    run_graceful_with_state,
};
use vastrayl_types::claim::ApiClaim;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, extra_args: &[&str]) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("vastrayl_{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let mut args = vec![
        "vastrayl-e2e-tests",
        "--data-dir",
        data_dir.as_str(),
        "--port",
        port.as_str(),
    ];
    args.extend_from_slice(extra_args);
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Running server, stopped gracefully when dropped.
pub struct TestEnv {
    pub base_url: Url,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    _config_guard: ConfigGuard,
}

impl TestEnv {
    pub fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|e| panic!("Invalid path {path}: {e}"))
    }

    pub fn token_for(&self, user: &str) -> Result<String> {
        let claim = ApiClaim::new_expired(user);
        Ok(self.state.tokens().issue(claim)?)
    }

    /// Client sending bearer token of `user` with every request.
    pub fn client_for(&self, user: &str) -> Result<reqwest::Client> {
        let token = self.token_for(user)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(client)
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn launch_env(test_name: &str) -> Result<TestEnv> {
    launch_env_with_args(test_name, &[]).await
}

pub async fn launch_env_with_args(test_name: &str, extra_args: &[&str]) -> Result<TestEnv> {
    let (args, config_guard) = test_config(test_name, extra_args)?;
    let base_url: Url = format!("http://127.0.0.1:{}/", args.port).parse()?;
    let state = build_state(&args).await?;
    let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
    let server_state = state.clone();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_receiver.await;
        };
        if let Err(e) = run_graceful_with_state(args, server_state, shutdown).await {
            tracing::error!("Test server failed: {e}");
        }
    });

    wait_for_health(&base_url).await?;
    debug!("Test server for {test_name} running at {base_url}");

    Ok(TestEnv {
        base_url,
        state,
        shutdown: Some(shutdown_sender),
        _config_guard: config_guard,
    })
}

async fn wait_for_health(base_url: &Url) -> Result<()> {
    let client = reqwest::Client::new();
    let url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Err(anyhow!("Server did not start"))
}
