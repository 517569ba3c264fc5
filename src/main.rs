use std::sync::Arc;

use anyhow::Context;
use inventory_service::{
    app::{self, product::seed},
    config::load_config,
    infrastructure::{database::DatabaseManager, logger::Logger},
    AppState,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("加载配置失败")?;
    let _log_guard = Logger::init(&config.logging).context("初始化日志失败")?;

    info!("启动库存管理服务...");

    // 种子文件在清空集合之前读取，文件有误时不会破坏现有数据
    let seed_products = seed::load_seed_file(&config.seed.path).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!("连接数据库: {}", config.database.masked_url());
    let database = match DatabaseManager::new(&config.database).await {
        Ok(database) => database,
        Err(e) => {
            error!("数据库连接失败: {}", e);
            return Err(e).context("数据库连接失败");
        }
    };
    info!("数据库连接成功");

    database.create_tables().await.context("创建数据表失败")?;

    let repo = Arc::new(database.product_repository());
    seed::seed_products(repo.as_ref(), seed_products)
        .await
        .context("导入种子数据失败")?;

    let state = AppState::new(repo);
    let app = app::router(state, config.server.timeout());

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法绑定到地址 {}", addr))?;

    info!("🚀 服务运行在 http://{}", addr);
    info!("   GET    /products          - 产品列表 (按名称、价格、数量过滤)");
    info!("   POST   /products          - 创建产品");
    info!("   PUT    /products/:id      - 更新产品");
    info!("   DELETE /products/:id      - 删除产品");
    info!("   GET    /inventory-report  - 库存报表");
    info!("   GET    /health            - 健康检查");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器运行失败")?;

    database.close().await;
    info!("数据库连接已关闭，服务已退出");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("无法监听 Ctrl+C 信号: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("无法监听 SIGTERM 信号: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到 Ctrl+C，正在关闭服务"),
        _ = terminate => info!("收到终止信号，正在关闭服务"),
    }
}
