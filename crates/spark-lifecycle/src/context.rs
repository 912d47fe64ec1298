//! 请求上下文与服务异常捕获。
//!
//! ## 核心意图（Why）
//! - 服务在处理请求时抛出的异常需要传递给日志/响应构造等下游消费者；
//! - 以显式的可选字段承载，而不是字符串键的属性表：缺失就是 `None`，所有权在类型签名中可见。

use alloc::sync::Arc;
use core::fmt;
use std::error::Error;

/// 被捕获的服务异常，可在多个消费者之间共享。
pub type CapturedError = Arc<dyn Error + Send + Sync + 'static>;

/// 单个流上的服务请求上下文。
///
/// # 教案式说明
/// - **意图 (Why)**：让生产者（服务实现）与消费者（访问日志、响应构造）通过同一个值交换异常；
/// - **契约 (What)**：
///   - `connection_id` / `stream_id`：请求所在的连接与流，便于把异常与 GOAWAY 日志对齐；
///   - `captured_error`：未捕获时为 `None`，重复捕获以最后一次为准；
/// - **风险 (Trade-offs)**：上下文由请求所在的执行上下文独占，字段修改不加锁。
#[derive(Clone)]
pub struct ServiceRequestContext {
    connection_id: Arc<str>,
    stream_id: u32,
    captured_error: Option<CapturedError>,
}

impl ServiceRequestContext {
    pub fn new(connection_id: impl Into<Arc<str>>, stream_id: u32) -> Self {
        Self {
            connection_id: connection_id.into(),
            stream_id,
            captured_error: None,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    /// 记录服务异常，覆盖之前捕获的值。
    pub fn capture_error<E>(&mut self, error: E)
    where
        E: Error + Send + Sync + 'static,
    {
        self.captured_error = Some(Arc::new(error));
    }

    /// 记录已共享的服务异常。
    pub fn capture_shared_error(&mut self, error: CapturedError) {
        self.captured_error = Some(error);
    }

    pub fn captured_error(&self) -> Option<&CapturedError> {
        self.captured_error.as_ref()
    }

    /// 取走捕获的异常，之后 `captured_error()` 返回 `None`。
    pub fn take_captured_error(&mut self) -> Option<CapturedError> {
        self.captured_error.take()
    }
}

impl fmt::Debug for ServiceRequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRequestContext")
            .field("connection_id", &self.connection_id)
            .field("stream_id", &self.stream_id)
            .field(
                "captured_error",
                &self.captured_error.as_ref().map(|err| err.to_string()),
            )
            .finish()
    }
}
