#![deny(unsafe_code)]
#![doc = r#"
# spark-lifecycle

## 设计动机（Why）
- **定位**：多协议 RPC/HTTP 框架中 HTTP/2 连接的生命周期与关闭协调层；
- **核心问题**：任一端都可能随时发起 GOAWAY，本端既可能是发起方也可能是响应方。
  只要协作式关闭仍然可能，连接就不应在流中途被粗暴关闭；
- **架构角色**：连接处理器在发送/接收 GOAWAY 时调用 [`ShutdownCoordinator`]，
  在流关闭时调用 [`StreamCloseObserver`]。帧编解码、传输与 TLS 均不在本 crate 内。

## 核心契约（What）
- 收到对端 GOAWAY 而本端尚未发送时，协调器对 [`ConnectionHandle`] 恰好请求一次优雅关闭；
- 错误码为 0 的 GOAWAY 记录为 DEBUG，非零错误码记录为 WARN，未注册的错误码渲染为 `UNKNOWN(code)`；
- 任何 GOAWAY 输入都不会让协调器返回错误。

## 实现策略（How）
- 状态由连接处理器独占并串行修改，不加锁；跨上下文读取使用 [`ShutdownProbe`] 的建议性快照；
- 日志统一经 `tracing` 输出，需要时可通过 [`logging`] 安装 `fmt + EnvFilter` 订阅器；
- 启用 `runtime-tokio` 特性时提供 [`TokioConnectionHandle`]。
"#]

extern crate alloc;

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod error_code;
pub mod handle;
pub mod logging;
pub mod observer;
#[cfg(feature = "runtime-tokio")]
pub mod runtime;
pub mod signal;

pub use config::{LastStreamIdPolicy, LifecycleConfig};
pub use context::{CapturedError, ServiceRequestContext};
pub use coordinator::{ShutdownCoordinator, ShutdownPhase, ShutdownProbe, ShutdownState};
pub use error::LifecycleError;
pub use error_code::{Http2ErrorCode, ShutdownClassification};
pub use handle::{ConnectionHandle, StreamHandle, StreamSnapshot, StreamState};
pub use observer::StreamCloseObserver;
#[cfg(feature = "runtime-tokio")]
pub use runtime::TokioConnectionHandle;
pub use signal::{GoAwayDirection, GoAwaySignal};
