use std::time::Duration;
use storefront::infrastructure::{config, logger};
use storefront::{router, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    let _log_guard = logger::init(&config.logging)?;

    info!("启动 storefront...");
    if config.session.uses_default_secret() {
        warn!("未设置 FLASK_SECRET_KEY，会话使用开发密钥签名");
    }

    let state = AppState::from_config(&config);

    // 数据文件损坏时在此终止启动
    let backfilled = state.users.backfill_codes()?;
    if backfilled > 0 {
        info!("已为 {} 个存量用户补齐编码", backfilled);
    }
    let product_count = state.products.count()?;
    info!(
        "已加载 {} 和 {}（{} 个商品）",
        config.storage.users_path().display(),
        config.storage.products_path().display(),
        product_count
    );

    let app = router(state, Duration::from_secs(config.http.timeout_seconds));

    let addr = config.http.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("🚀 storefront 运行在 http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("storefront 已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听关闭信号失败: {}", e);
        std::future::pending::<()>().await;
    }
}
