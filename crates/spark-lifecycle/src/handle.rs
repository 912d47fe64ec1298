use alloc::borrow::Cow;
use core::fmt;

/// 连接句柄契约：协调器只引用、不持有连接。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 协调器收到对端 GOAWAY 后需要请求本端优雅关闭，但不应了解 TCP/TLS 等具体传输；
/// - 连接标识用于日志定位，与传输层 `TransportConnection::id` 的语义保持一致。
///
/// ## 契约说明（What）
/// - `id`：稳定、可读的连接标识，生命周期内不变；
/// - `close`：提交优雅关闭请求并立即返回；连接句柄负责先发送 GOAWAY、等待在途流结束，
///   再关闭传输层；
/// - **前置条件**：两方法都在连接所属的执行上下文中被调用；
/// - **后置条件**：对已关闭（或正在关闭）的连接重复调用 `close` 必须是 no-op。
///
/// ## 风险提示（Trade-offs）
/// - `close` 不返回结果，失败由连接句柄自行处理与记录；协调器视角下关闭请求总是“已提交”。
pub trait ConnectionHandle {
    /// 返回可用于日志或追踪的连接 ID。
    fn id(&self) -> Cow<'_, str>;

    /// 请求优雅关闭，必须幂等且非阻塞。
    fn close(&self);
}

/// 流句柄契约：仅暴露诊断所需的只读信息。
pub trait StreamHandle {
    /// 流标识（31 位）。
    fn id(&self) -> u32;

    /// 流当前所处的生命周期状态。
    fn state(&self) -> StreamState;
}

/// RFC 9113 §5.1 定义的流状态。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StreamState {
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

impl StreamState {
    /// 规范名称，用于日志渲染。
    pub fn as_str(self) -> &'static str {
        match self {
            StreamState::Idle => "IDLE",
            StreamState::ReservedLocal => "RESERVED_LOCAL",
            StreamState::ReservedRemote => "RESERVED_REMOTE",
            StreamState::Open => "OPEN",
            StreamState::HalfClosedLocal => "HALF_CLOSED_LOCAL",
            StreamState::HalfClosedRemote => "HALF_CLOSED_REMOTE",
            StreamState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 由 `(id, state)` 直接构成的流快照，适合连接处理器在流关闭回调中临时构造。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamSnapshot {
    pub id: u32,
    pub state: StreamState,
}

impl StreamHandle for StreamSnapshot {
    fn id(&self) -> u32 {
        self.id
    }

    fn state(&self) -> StreamState {
        self.state
    }
}
