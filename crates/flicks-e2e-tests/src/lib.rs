pub mod rest;

use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use flicks_server::{
    build_state,
    config::{Parser, ServerConfig},
    run_graceful_with_state,
};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, info};

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(4030..5030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
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

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "flicks-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--db-max-open-conns",
        "4",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

pub fn base_url(args: &ServerConfig) -> Result<Url> {
    let url = Url::parse(&format!("http://{}:{}/", args.listen_address, args.port))?;
    Ok(url)
}

/// Running server, stopped gracefully when dropped.
pub struct ServerGuard {
    shutdown: Option<oneshot::Sender<()>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server(args: ServerConfig) -> Result<ServerGuard> {
    let url = base_url(&args)?.join("v1/healthcheck")?;
    let state = build_state(&args).await?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = run_graceful_with_state(args, state, shutdown).await {
            panic!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for attempt in 0..50 {
        match client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Server is up after {attempt} attempts");
                return Ok(ServerGuard {
                    shutdown: Some(shutdown_tx),
                    handle,
                });
            }
            Ok(response) => debug!("Healthcheck returned {}", response.status()),
            Err(e) => debug!("Server not ready: {e}"),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Err(anyhow!("Server did not start in time"))
}

pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, ServerGuard)> {
    let guard = spawn_server(args).await?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok((client, guard))
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("Url cannot be base")
        .pop_if_empty()
        .push(&segment.to_string());
    url
}
