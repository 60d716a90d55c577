//! 日志基础设施

use super::config::LoggingConfig;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 安装全局订阅者：`log_dir` 下按天滚动的日志文件，按配置附加彩色控制台输出。
/// `RUST_LOG` 优先于配置的级别。
///
/// 返回的 guard 需在进程生命周期内保持存活，释放后后台写文件线程即停止。
pub fn init(config: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let console = config
        .console_output
        .then(|| fmt::layer().with_writer(std::io::stdout).with_ansi(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_thread_names(true),
        )
        .with(console)
        .try_init()?;

    Ok(guard)
}
