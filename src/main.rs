//! Premium prediction server entry point.

use anyhow::Context;
use tracing::info;

use premium::api::{self, HttpState};
use premium::artifacts::service as artifacts;
use premium::common::{log, AppCfg};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppCfg::load();
    log::init(&cfg);

    let addr = cfg.listen_addr()?;
    let model = artifacts::load_from_cfg(&cfg);
    let state = HttpState::new(model, cfg.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    api::serve(listener, state, shutdown_signal()).await?;
    info!(ev = "shutdown", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
