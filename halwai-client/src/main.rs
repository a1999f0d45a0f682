//! halwai-watch - 终端订单看板
//!
//! 连接后台, 保持本地订单/分店/员工与服务器同步, 并把变更打印到日志。

use anyhow::Context;
use clap::Parser;
use halwai_client::{AdminSession, ClientConfig, StoreChange, logger};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Parser)]
#[command(name = "halwai-watch", version, about = "Watch Mr Halwai orders in realtime")]
struct Args {
    /// REST base URL
    #[arg(long, env = "HALWAI_BACKEND_URL")]
    backend_url: Option<String>,

    /// Socket.IO server URL
    #[arg(long, env = "HALWAI_SOCKET_URL")]
    socket_url: Option<String>,

    /// Socket.IO path
    #[arg(long, env = "HALWAI_SOCKET_PATH")]
    socket_path: Option<String>,

    /// Directory for local state (active branch)
    #[arg(long, env = "HALWAI_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Only show orders of this branch
    #[arg(long)]
    shop: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write rolling log files here
    #[arg(long)]
    log_dir: Option<String>,

    /// JSON log output
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env 必须在解析参数前加载, clap 的 env 回退才能读到
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    logger::init_logger_with_file(&args.log_level, args.json, args.log_dir.as_deref())
        .context("failed to initialise logging")?;

    // 2. 配置: 环境变量 + 命令行覆盖
    let mut config = ClientConfig::from_env();
    if let Some(url) = args.backend_url {
        config = config.with_backend_url(url);
    }
    if let Some(url) = args.socket_url {
        config = config.with_socket_url(url);
    }
    if let Some(path) = args.socket_path {
        config.realtime = config.realtime.with_path(path);
    }
    if let Some(dir) = args.state_dir {
        config = config.with_state_dir(dir);
    }

    tracing::info!(
        backend = %config.backend_url,
        realtime = %config.realtime.endpoint(),
        "halwai-watch starting"
    );

    // 3. 会话
    let session = AdminSession::new(&config).context("failed to build admin session")?;
    if let Some(shop) = &args.shop {
        session.active_shop().set(Some(shop.clone()))?;
    }
    let mut changes = session.changes();
    session.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down");
                break;
            }
            change = changes.recv() => match change {
                Ok(change) => report(&session, &change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.shutdown().await;
    Ok(())
}

fn report(session: &AdminSession, change: &StoreChange) {
    let active = session.active_shop().get();
    match change {
        StoreChange::OrdersReplaced { .. } => {
            let orders = match &active {
                Some(shop) => session.orders().for_shop(shop),
                None => session.orders().snapshot(),
            };
            tracing::info!(count = orders.len(), shop = ?active, "Orders loaded");
            for order in &orders {
                tracing::info!(
                    order = %order.short_id(),
                    status = %order.status.label(),
                    total = order.total_amount,
                    items = order.order_items.len(),
                    "  order"
                );
            }
        }
        StoreChange::OrderInserted { id } | StoreChange::OrderUpdated { id } => {
            if let Some(order) = session.orders().get(id)
                && active.as_deref().is_none_or(|shop| order.belongs_to(shop))
            {
                let actions: Vec<&str> = shared::order::next_actions(order.status)
                    .iter()
                    .map(|a| a.label)
                    .collect();
                tracing::info!(
                    order = %order.short_id(),
                    status = %order.status.label(),
                    rider = order.rider_info.as_ref().map(|r| r.name()),
                    next = ?actions,
                    "Order changed"
                );
            }
        }
        StoreChange::OrderRemoved { id } => tracing::info!(order_id = %id, "Order removed"),
        StoreChange::ShopsReplaced { count } => {
            let label = session.shop_service().active_shop().map(|s| s.label().to_string());
            tracing::info!(count, active = ?label, "Branches loaded");
        }
        StoreChange::ShopUpdated { id } => tracing::info!(shop_id = %id, "Branch updated"),
        StoreChange::EmployeesReplaced { count } => {
            tracing::info!(count, riders = session.employees().riders().len(), "Staff loaded");
        }
    }
}
