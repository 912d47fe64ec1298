use alloc::{borrow::Cow, sync::Arc};

use tokio::sync::watch;
use tracing::debug;

use crate::handle::ConnectionHandle;

#[derive(Debug)]
struct TokioConnectionInner {
    id: Arc<str>,
    close_requested: watch::Sender<bool>,
}

/// 基于 Tokio `watch` 通道的连接句柄。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 协调器只会“提交”关闭请求，真正的收尾（回送 GOAWAY、等待在途流、关闭传输）由连接驱动任务完成；
/// - `watch` 通道天然满足“只关心最新值”的语义，多个驱动任务可同时等待同一关闭请求。
///
/// ## 逻辑 (How)
/// - `close` 通过 `send_if_modified` 把标志从 `false` 置为 `true`，已为 `true` 时不通知任何接收者；
/// - [`closed`](Self::closed) 订阅通道并等待标志变为 `true`。
///
/// ## 契约 (What)
/// - `close` 非阻塞、幂等，可在任意线程调用；
/// - 克隆共享同一关闭标志。
#[derive(Clone, Debug)]
pub struct TokioConnectionHandle {
    inner: Arc<TokioConnectionInner>,
}

impl TokioConnectionHandle {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        let (close_requested, _) = watch::channel(false);
        Self {
            inner: Arc::new(TokioConnectionInner {
                id: id.into(),
                close_requested,
            }),
        }
    }

    /// 是否已有关闭请求。
    pub fn is_close_requested(&self) -> bool {
        *self.inner.close_requested.borrow()
    }

    /// 等待关闭请求；请求已存在时立即返回。
    pub async fn closed(&self) {
        let mut receiver = self.inner.close_requested.subscribe();
        // 发送端由 `self` 持有，等待期间不会被关闭。
        let _ = receiver.wait_for(|requested| *requested).await;
    }
}

impl ConnectionHandle for TokioConnectionHandle {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.inner.id)
    }

    fn close(&self) {
        let first = self.inner.close_requested.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        });
        if first {
            debug!(connection = %self.inner.id, "graceful close requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::ShutdownCoordinator;
    use crate::signal::GoAwaySignal;
    use std::time::Duration;

    #[tokio::test]
    async fn close_is_idempotent() {
        let handle = TokioConnectionHandle::new("tokio-conn-1");
        assert!(!handle.is_close_requested());

        handle.close();
        handle.close();

        assert!(handle.is_close_requested());
        tokio::time::timeout(Duration::from_secs(1), handle.closed())
            .await
            .expect("已请求关闭时 closed() 应立即完成");
    }

    #[tokio::test]
    async fn received_go_away_wakes_connection_driver() {
        let handle = TokioConnectionHandle::new("tokio-conn-2");
        let driver = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.closed().await })
        };

        let mut coordinator = ShutdownCoordinator::default();
        coordinator.on_go_away_received(&handle, &GoAwaySignal::without_debug_data(5, 0));

        tokio::time::timeout(Duration::from_secs(1), driver)
            .await
            .expect("驱动任务应在关闭请求后被唤醒")
            .expect("驱动任务不应 panic");
        assert_eq!(handle.id(), "tokio-conn-2");
    }
}
