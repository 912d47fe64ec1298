//! 连接生命周期配置。
//!
//! # 教案式导航
//! - **来源（Where）**：宿主通常把本段配置嵌入自身的 TOML 文件，再交给 [`LifecycleConfig::from_toml_str`]；
//! - **默认值（What）**：未出现的字段一律取 [`Default`]，空文本即得到默认配置；
//! - **校验（How）**：反序列化后统一执行 [`LifecycleConfig::validate`]，把非法取值挡在装配阶段。

use serde::Deserialize;

use crate::error::LifecycleError;
use crate::signal::STREAM_ID_MASK;

/// 默认的升级流标识：HTTP/1.1 升级到 HTTP/2 后的首个流。
pub const DEFAULT_UPGRADE_STREAM_ID: u32 = 1;
/// 日志中渲染调试数据的默认字节上限。
pub const DEFAULT_DEBUG_DATA_LIMIT: usize = 256;

/// 对端重复发送 GOAWAY 时如何处理 `last_stream_id`。
///
/// # 教案式说明
/// - **意图 (Why)**：协议期望后续 GOAWAY 只会收窄对端仍会处理的流集合，但对端可能违反该约定；
/// - **契约 (What)**：
///   - `NarrowOnly`：流边界只降不升，放宽部分被忽略并以 WARN 记录，错误码仍取最新值；
///   - `LastWriteWins`：每次直接覆盖，与早期实现的行为一致；
/// - **风险 (Trade-offs)**：`NarrowOnly` 可能让本端少发起几个对端实际愿意处理的流，换来的是
///   绝不在对端已放弃的流上继续工作。
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LastStreamIdPolicy {
    #[default]
    NarrowOnly,
    LastWriteWins,
}

/// 连接生命周期的可调参数。
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// 重复 GOAWAY 的流边界处理策略。
    pub last_stream_id_policy: LastStreamIdPolicy,
    /// 需要单独诊断的升级流标识。
    pub upgrade_stream_id: u32,
    /// WARN 日志中调试数据的最大字节数。
    pub debug_data_limit: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            last_stream_id_policy: LastStreamIdPolicy::default(),
            upgrade_stream_id: DEFAULT_UPGRADE_STREAM_ID,
            debug_data_limit: DEFAULT_DEBUG_DATA_LIMIT,
        }
    }
}

impl LifecycleConfig {
    /// 从 TOML 文本解析并校验配置。
    pub fn from_toml_str(text: &str) -> Result<Self, LifecycleError> {
        let config: LifecycleConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 语义校验：升级流必须是奇数、非零且位于 31 位范围内。
    pub fn validate(&self) -> Result<(), LifecycleError> {
        let stream_id = self.upgrade_stream_id;
        if stream_id == 0 || stream_id % 2 == 0 || stream_id & !STREAM_ID_MASK != 0 {
            return Err(LifecycleError::InvalidUpgradeStreamId { stream_id });
        }
        Ok(())
    }

    pub fn with_last_stream_id_policy(mut self, policy: LastStreamIdPolicy) -> Self {
        self.last_stream_id_policy = policy;
        self
    }

    pub fn with_debug_data_limit(mut self, limit: usize) -> Self {
        self.debug_data_limit = limit;
        self
    }
}
