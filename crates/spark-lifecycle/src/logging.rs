//! 日志订阅器装配。
//!
//! 协调器只通过 `tracing` 宏决定日志内容与级别，日志如何输出由宿主决定；
//! 未自带订阅器的宿主可使用本模块安装 `fmt + EnvFilter` 组合。

use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

use crate::error::LifecycleError;

/// 未设置 `RUST_LOG` 时使用的过滤指令。
pub const DEFAULT_DIRECTIVES: &str = "info";

/// 安装全局订阅器，过滤指令优先读取 `RUST_LOG`，否则回退为 [`DEFAULT_DIRECTIVES`]。
///
/// 进程内已有全局订阅器时返回 [`LifecycleError::SubscriberAlreadySet`]。
pub fn install_default_subscriber() -> Result<(), LifecycleError> {
    install_with_filter(build_env_filter())
}

/// 以显式指令安装全局订阅器，例如 `"spark_lifecycle=debug"` 可打开清洁 GOAWAY 的 DEBUG 日志。
pub fn install_with_directives(directives: &str) -> Result<(), LifecycleError> {
    install_with_filter(filter_from_directives(directives)?)
}

/// 解析过滤指令。
pub fn filter_from_directives(directives: &str) -> Result<EnvFilter, LifecycleError> {
    Ok(EnvFilter::try_new(directives)?)
}

fn install_with_filter(filter: EnvFilter) -> Result<(), LifecycleError> {
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}
