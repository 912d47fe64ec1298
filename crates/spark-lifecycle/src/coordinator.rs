//! # GOAWAY 双向关闭协调
//!
//! ## 核心意图（Why）
//! - 任一端都可能随时发起 GOAWAY，本端既可能是发起方也可能是响应方；
//! - 一旦任一方向出现 GOAWAY，另一方向也必须跟进，双方才会收敛到同一终态，
//!   而不是一端无限期等待另一端。
//!
//! ## 架构定位（Where）
//! - 每个连接持有一个 [`ShutdownCoordinator`]，由连接处理器在发送/接收 GOAWAY 时调用；
//! - 协调器只引用 [`ConnectionHandle`]，在需要回应时提交一次优雅关闭请求，
//!   `Closed` 终态属于连接句柄，协调器的职责止于 [`ShutdownPhase::Converged`]。
//!
//! ## 状态机约束（What）
//! - `Active → LocalSignalSent | RemoteSignalReceived → Converged`，两个标志相互独立；
//! - 不存在回到 `Active` 的跃迁，`sent` 只会从 `false` 变为 `true`。
//!
//! ## 并发模型（How）
//! - 变更操作取 `&mut self`，由连接所属的单一执行上下文串行调用，内部不加锁；
//! - 跨上下文的只读观察通过 [`ShutdownProbe`] 完成，读到的是建议性快照，不保证线性一致。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use tracing::{Level, debug, warn};

use crate::config::{LastStreamIdPolicy, LifecycleConfig};
use crate::handle::ConnectionHandle;
use crate::signal::{GoAwayDirection, GoAwaySignal};

/// 单个连接的关闭状态。
///
/// # 教案式说明
/// - **意图 (Why)**：显式建模为连接处理器独占的值，而不是挂在连接对象上的属性表；
/// - **契约 (What)**：
///   - `sent`：本端是否已发送 GOAWAY，单调；
///   - `received_error_code`：未收到时为 `None`，否则为最近一次接收的错误码；
///   - `last_stream_id_observed`：对端声明仍会处理的最大流 ID，仅在收到 GOAWAY 后有意义；
///   - `last_stream_id_sent`：本端最近一次 GOAWAY 声明的流 ID；
///   - `close_requested`：协调器是否已提交过关闭请求，保证每个连接至多回应一次。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShutdownState {
    sent: bool,
    received_error_code: Option<u32>,
    last_stream_id_observed: u32,
    last_stream_id_sent: Option<u32>,
    close_requested: bool,
}

impl ShutdownState {
    pub fn sent(&self) -> bool {
        self.sent
    }

    pub fn received_error_code(&self) -> Option<u32> {
        self.received_error_code
    }

    /// 对端声明的流边界；尚未收到 GOAWAY 时返回 `None`。
    pub fn last_stream_id_observed(&self) -> Option<u32> {
        self.received_error_code.map(|_| self.last_stream_id_observed)
    }

    pub fn last_stream_id_sent(&self) -> Option<u32> {
        self.last_stream_id_sent
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// 由两个独立标志推导出的阶段。
    pub fn phase(&self) -> ShutdownPhase {
        ShutdownPhase::from_flags(self.sent, self.received_error_code.is_some())
    }
}

/// 连接关闭的阶段视图。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShutdownPhase {
    /// 双方均未发出 GOAWAY。
    Active,
    /// 仅本端发出 GOAWAY。
    LocalSignalSent,
    /// 仅收到对端 GOAWAY。
    RemoteSignalReceived,
    /// 双向 GOAWAY 均已完成，连接等待在途流结束后关闭。
    Converged,
}

impl ShutdownPhase {
    fn from_flags(sent: bool, received: bool) -> Self {
        match (sent, received) {
            (false, false) => ShutdownPhase::Active,
            (true, false) => ShutdownPhase::LocalSignalSent,
            (false, true) => ShutdownPhase::RemoteSignalReceived,
            (true, true) => ShutdownPhase::Converged,
        }
    }

    /// 是否已进入关闭流程。
    pub fn is_shutting_down(self) -> bool {
        !matches!(self, ShutdownPhase::Active)
    }
}

const FLAG_SENT: u8 = 0b001;
const FLAG_RECEIVED: u8 = 0b010;
const FLAG_RECEIVED_ERROR: u8 = 0b100;

#[derive(Debug, Default)]
struct ProbeCells {
    flags: AtomicU8,
    last_stream_id_observed: AtomicU32,
}

/// 供其他执行上下文读取的关闭状态探针。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 健康检查等组件需要一次巡检大量连接，而变更只发生在连接自身的执行上下文中；
/// - 探针让这类读取无需借用协调器，也无需引入锁。
///
/// ## 契约（What）
/// - 协调器在每次变更后刷新探针；
/// - 读取使用 `Relaxed` 序，结果是建议性快照，可能略微滞后，不保证与协调器线性一致；
/// - 克隆开销为一次 `Arc` 引用计数递增。
#[derive(Clone, Debug, Default)]
pub struct ShutdownProbe {
    cells: Arc<ProbeCells>,
}

impl ShutdownProbe {
    pub fn has_sent_go_away(&self) -> bool {
        self.flags() & FLAG_SENT != 0
    }

    pub fn has_received_go_away(&self) -> bool {
        self.flags() & FLAG_RECEIVED != 0
    }

    pub fn has_received_error_go_away(&self) -> bool {
        self.flags() & FLAG_RECEIVED_ERROR != 0
    }

    /// 对端声明的流边界快照；尚未观察到 GOAWAY 时返回 `None`。
    pub fn last_stream_id_observed(&self) -> Option<u32> {
        self.has_received_go_away()
            .then(|| self.cells.last_stream_id_observed.load(Ordering::Relaxed))
    }

    pub fn phase(&self) -> ShutdownPhase {
        let flags = self.flags();
        ShutdownPhase::from_flags(flags & FLAG_SENT != 0, flags & FLAG_RECEIVED != 0)
    }

    fn flags(&self) -> u8 {
        self.cells.flags.load(Ordering::Relaxed)
    }

    fn publish(&self, state: &ShutdownState) {
        let mut flags = 0;
        if state.sent {
            flags |= FLAG_SENT;
        }
        if let Some(code) = state.received_error_code {
            flags |= FLAG_RECEIVED;
            if code != 0 {
                flags |= FLAG_RECEIVED_ERROR;
            }
        }
        self.cells
            .last_stream_id_observed
            .store(state.last_stream_id_observed, Ordering::Relaxed);
        self.cells.flags.store(flags, Ordering::Relaxed);
    }
}

/// 单个连接的 GOAWAY 决策引擎。
///
/// # 教案式说明
/// - **意图 (Why)**：集中决定 GOAWAY 事件对连接的影响，并按错误码分类决定日志级别；
/// - **契约 (What)**：
///   - [`on_go_away_sent`](Self::on_go_away_sent)：纯记账加日志，永不失败；
///   - [`on_go_away_received`](Self::on_go_away_received)：更新接收状态并记录日志；若本端尚未发送
///     GOAWAY 且未请求过关闭，则调用一次 [`ConnectionHandle::close`]；
///   - `has_*` 查询无副作用；
/// - **风险 (Trade-offs)**：协调器不感知关闭请求是否成功，失败由连接句柄负责，且句柄的 `close`
///   必须幂等。
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: ShutdownState,
    policy: LastStreamIdPolicy,
    debug_data_limit: usize,
    probe: ShutdownProbe,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(&LifecycleConfig::default())
    }
}

impl ShutdownCoordinator {
    /// 按配置构造处于 `Active` 阶段的协调器。
    pub fn new(config: &LifecycleConfig) -> Self {
        Self {
            state: ShutdownState::default(),
            policy: config.last_stream_id_policy,
            debug_data_limit: config.debug_data_limit,
            probe: ShutdownProbe::default(),
        }
    }

    /// 本端已发送 GOAWAY（运维摘流、致命协议错误、空闲超时等任意原因）。
    pub fn on_go_away_sent<C>(&mut self, conn: &C, signal: &GoAwaySignal)
    where
        C: ConnectionHandle + ?Sized,
    {
        self.state.sent = true;
        self.state.last_stream_id_sent = Some(signal.last_stream_id());
        self.log_go_away(conn, GoAwayDirection::Sent, signal, signal.last_stream_id(), None);
        self.probe.publish(&self.state);
    }

    /// 收到对端 GOAWAY。
    ///
    /// # 教案式注释
    /// - **执行 (How)**：
    ///   1. 按 [`LastStreamIdPolicy`] 计算新的流边界，错误码总是取最新值；
    ///   2. 按错误码分类输出一条 DEBUG 或 WARN 日志；被忽略的放宽请求只作为该条日志的附加字段，
    ///      不会额外产生日志；
    ///   3. 本端尚未发送 GOAWAY 时请求优雅关闭：连接句柄会先回送 GOAWAY，待在途流完成后再关闭传输，
    ///      因此不会中断活跃流；
    /// - **后置条件**：`has_received_go_away()` 为 `true`；整个连接生命周期内 `close` 至多被调用一次。
    pub fn on_go_away_received<C>(&mut self, conn: &C, signal: &GoAwaySignal)
    where
        C: ConnectionHandle + ?Sized,
    {
        let requested = signal.last_stream_id();
        let ignored_widening = match (self.policy, self.state.last_stream_id_observed()) {
            (LastStreamIdPolicy::NarrowOnly, Some(previous)) if requested > previous => {
                Some(previous)
            }
            _ => None,
        };
        let bound = ignored_widening.unwrap_or(requested);

        self.state.received_error_code = Some(signal.error_code());
        self.state.last_stream_id_observed = bound;
        self.log_go_away(conn, GoAwayDirection::Received, signal, bound, ignored_widening);

        if !self.state.sent && !self.state.close_requested {
            self.state.close_requested = true;
            debug!(
                connection = %conn.id(),
                "reciprocating GOAWAY by requesting a graceful close"
            );
            conn.close();
        }

        self.probe.publish(&self.state);
    }

    pub fn has_sent_go_away(&self) -> bool {
        self.state.sent
    }

    pub fn has_received_go_away(&self) -> bool {
        self.state.received_error_code.is_some()
    }

    /// 是否收到过非零错误码的 GOAWAY（以最近一次为准）。
    pub fn has_received_error_go_away(&self) -> bool {
        matches!(self.state.received_error_code, Some(code) if code != 0)
    }

    pub fn phase(&self) -> ShutdownPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &ShutdownState {
        &self.state
    }

    /// 对端是否仍会处理 `stream_id`；未收到 GOAWAY 时总是 `true`。
    pub fn peer_will_process(&self, stream_id: u32) -> bool {
        self.state
            .last_stream_id_observed()
            .is_none_or(|bound| stream_id <= bound)
    }

    /// 返回可跨执行上下文共享的探针。
    pub fn probe(&self) -> ShutdownProbe {
        self.probe.clone()
    }

    /// 每个 GOAWAY 事件恰好一条日志，级别只由错误码分类决定。
    ///
    /// `previous_last_stream_id` 仅在放宽请求被忽略时出现，`applied_last_stream_id` 为实际生效的边界。
    fn log_go_away<C>(
        &self,
        conn: &C,
        direction: GoAwayDirection,
        signal: &GoAwaySignal,
        applied_last_stream_id: u32,
        previous_last_stream_id: Option<u32>,
    ) where
        C: ConnectionHandle + ?Sized,
    {
        let classification = signal.classification();
        if classification.level() == Level::WARN {
            warn!(
                connection = %conn.id(),
                direction = %direction,
                last_stream_id = signal.last_stream_id(),
                applied_last_stream_id,
                previous_last_stream_id,
                error_code = %classification,
                debug_data = %signal.debug_text(self.debug_data_limit),
                "{direction} a GOAWAY frame"
            );
        } else {
            debug!(
                connection = %conn.id(),
                direction = %direction,
                last_stream_id = signal.last_stream_id(),
                applied_last_stream_id,
                previous_last_stream_id,
                error_code = %classification,
                "{direction} a GOAWAY frame"
            );
        }
    }
}
