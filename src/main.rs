use anyhow::{Context, Result};
use som_executor::agents::web_agent::WebAgentConfig;
use som_executor::api::handlers::AppState;
use som_executor::api::routes::build_router;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = WebAgentConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    info!(
        webdriver_url = %config.webdriver_url,
        upload_url = %config.upload_url,
        decision_url = %config.decision_url,
        "configuration loaded"
    );

    let state = AppState::new(config);
    let app = build_router().with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    // 退出前关闭浏览器
    state.sessions.shutdown().await;
    Ok(())
}
