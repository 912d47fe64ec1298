//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - GOAWAY 的处理路径本身永不失败：任何错误码都会被归一化为分类结果；
//! - 唯一可能失败的是装配阶段，即配置解析校验与日志订阅器安装，此处集中定义这类错误。
//!
//! ## 设计要求（What）
//! - 所有错误派生 `thiserror::Error`，可直接交给 `anyhow` 等上层框架；
//! - 每个变体暴露稳定错误码，便于告警规则匹配。

use thiserror::Error;

/// 配置解析失败的稳定错误码。
pub const INVALID_CONFIG: &str = "spark.lifecycle.invalid_config";
/// 升级流标识非法的稳定错误码。
pub const INVALID_UPGRADE_STREAM_ID: &str = "spark.lifecycle.invalid_upgrade_stream_id";
/// 日志过滤指令无法解析的稳定错误码。
pub const INVALID_LOG_FILTER: &str = "spark.lifecycle.invalid_log_filter";
/// 全局 Subscriber 已被设置的稳定错误码。
pub const SUBSCRIBER_ALREADY_SET: &str = "spark.lifecycle.subscriber_already_set";

/// 生命周期模块的装配错误。
///
/// # 教案式说明
/// - **意图 (Why)**：把“配置文本无法解析”和“语义校验失败”区分开，运维可据此判断是格式问题还是取值问题；
/// - **契约 (What)**：变体均为 `Send + Sync + 'static`，可跨线程传播。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// TOML 文本无法反序列化为 [`LifecycleConfig`](crate::config::LifecycleConfig)。
    #[error("invalid lifecycle configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// 升级流必须是客户端发起的奇数流，且不能为 0。
    #[error("upgrade stream id {stream_id} must be an odd, non-zero, 31-bit stream id")]
    InvalidUpgradeStreamId { stream_id: u32 },

    /// `EnvFilter` 指令语法错误。
    #[error("invalid log filter directives: {0}")]
    InvalidLogFilter(#[from] tracing_subscriber::filter::ParseError),

    /// 进程内已存在全局 tracing Subscriber。
    #[error("global tracing subscriber already set: {0}")]
    SubscriberAlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

impl LifecycleError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::InvalidConfig(_) => INVALID_CONFIG,
            LifecycleError::InvalidUpgradeStreamId { .. } => INVALID_UPGRADE_STREAM_ID,
            LifecycleError::InvalidLogFilter(_) => INVALID_LOG_FILTER,
            LifecycleError::SubscriberAlreadySet(_) => SUBSCRIBER_ALREADY_SET,
        }
    }
}
