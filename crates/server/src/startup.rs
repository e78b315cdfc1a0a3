use std::net::SocketAddr;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use configs::AppConfig;
use service::AppContext;

use crate::routes;
use crate::state::AppState;

/// Permissive when no origins are configured, otherwise an exact allow-list.
pub fn build_cors(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::very_permissive());
    }
    let parsed = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).map_err(|e| anyhow::anyhow!("invalid cors origin {o:?}: {e}")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CorsLayer::very_permissive().allow_origin(AllowOrigin::list(parsed)))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(service = "server", event = "signal_error", error = %e);
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: init resources, serve until Ctrl+C, then release them.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    service::metrics::register_all();
    let ctx = AppContext::init(&cfg).await?;
    let state = AppState::new(ctx.services(), &cfg.admin.secret);
    let app = routes::build_router(state, build_cors(&cfg.server.cors_origins)?);

    let addr = bind_addr(&cfg)?;
    info!(service = "server", event = "listening", %addr, "starting admin console");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    ctx.teardown().await?;
    info!(service = "server", event = "stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_valid_origins_only() {
        assert!(build_cors(&[]).is_ok());
        assert!(build_cors(&["https://admin.example.com".to_string()]).is_ok());
        assert!(build_cors(&["bad\norigin".to_string()]).is_err());
    }
}
