use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::{routing::get, Router};
use tracing::{info, warn};

pub const SELF_PING_INTERVAL: Duration = Duration::from_secs(180);

/// ホスティング先のヘルスチェックに応答するだけのHTTPサーバー。
pub async fn run_health_server(addr: SocketAddr) -> Result<()> {
    let app = Router::new().route("/health", get(|| async { "OK" }));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("health server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 180秒ごとに自分のヘルスエンドポイントを叩いて
/// ホスティング先にアイドル停止させないようにする。
pub async fn self_ping_loop(url: String) {
    let client = reqwest::Client::new();
    loop {
        if let Err(e) = client.get(&url).send().await {
            warn!("self ping failed: {e}");
        }
        tokio::time::sleep(SELF_PING_INTERVAL).await;
    }
}
