//! Logging setup
//!
//! Console output plus, when a log directory is given, daily rotating files:
//!
//! - `app/halwai-watch.YYYY-MM-DD` - everything except audit records
//! - `audit/orders.YYYY-MM-DD` - order mutations (target `audit`)

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

pub const AUDIT_TARGET: &str = "audit";

/// Initialize console + optional file logging
///
/// `RUST_LOG` wins over `level` when set.
///
/// ```no_run
/// // 开发: 仅控制台
/// halwai_client::logger::init_logger_with_file("debug", false, None)?;
///
/// // 生产: JSON + 文件
/// halwai_client::logger::init_logger_with_file("info", true, Some("./logs"))?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let file_layers = match log_dir {
        Some(dir) => {
            let log_dir = Path::new(dir);
            let app_log_dir = log_dir.join("app");
            let audit_log_dir = log_dir.join("audit");
            fs::create_dir_all(&app_log_dir)?;
            fs::create_dir_all(&audit_log_dir)?;

            let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "halwai-watch");
            let app_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != AUDIT_TARGET
                }));

            let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "orders");
            let audit_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(audit_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == AUDIT_TARGET
                }));

            Some(app_layer.and_then(audit_layer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layers)
        .try_init()
        .map_err(io::Error::other)
}

/// Console-only logging
pub fn init_logger(level: &str, json_format: bool) -> io::Result<()> {
    init_logger_with_file(level, json_format, None)
}
