use tracing::debug;

use crate::config::{DEFAULT_UPGRADE_STREAM_ID, LifecycleConfig};
use crate::handle::{ConnectionHandle, StreamHandle};

/// 流关闭通知接收器，单独诊断升级流。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 经 HTTP/1.1 升级建立的 HTTP/2 连接，其首个请求落在保留的升级流上；
///   记录该流的最终状态可以确认升级后的首个流按预期结束。
///
/// ## 契约 (What)
/// - `on_stream_closed`：流 ID 等于升级流时输出一条 DEBUG 日志（连接 ID + 最终状态），
///   其余流不做任何处理；永不失败；
/// - 普通流的关闭由连接处理器的其他组件负责。
#[derive(Clone, Copy, Debug)]
pub struct StreamCloseObserver {
    upgrade_stream_id: u32,
}

impl Default for StreamCloseObserver {
    fn default() -> Self {
        Self {
            upgrade_stream_id: DEFAULT_UPGRADE_STREAM_ID,
        }
    }
}

impl StreamCloseObserver {
    pub fn new(config: &LifecycleConfig) -> Self {
        Self {
            upgrade_stream_id: config.upgrade_stream_id,
        }
    }

    pub fn upgrade_stream_id(&self) -> u32 {
        self.upgrade_stream_id
    }

    pub fn on_stream_closed<C, S>(&self, conn: &C, stream: &S)
    where
        C: ConnectionHandle + ?Sized,
        S: StreamHandle + ?Sized,
    {
        if stream.id() == self.upgrade_stream_id {
            debug!(
                connection = %conn.id(),
                stream_id = stream.id(),
                state = %stream.state(),
                "HTTP/2 upgrade stream closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{StreamSnapshot, StreamState};
    use alloc::borrow::Cow;
    use tracing_test::traced_test;

    struct NamedConnection(&'static str);

    impl ConnectionHandle for NamedConnection {
        fn id(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.0)
        }

        fn close(&self) {}
    }

    #[traced_test]
    #[test]
    fn upgrade_stream_closure_is_logged() {
        let observer = StreamCloseObserver::default();
        let stream = StreamSnapshot {
            id: 1,
            state: StreamState::Closed,
        };

        observer.on_stream_closed(&NamedConnection("h2c-upgraded"), &stream);

        assert!(logs_contain("HTTP/2 upgrade stream closed"));
        assert!(logs_contain("connection=h2c-upgraded"));
        assert!(logs_contain("state=CLOSED"));
    }

    #[traced_test]
    #[test]
    fn ordinary_stream_closure_is_silent() {
        let observer = StreamCloseObserver::default();
        let stream = StreamSnapshot {
            id: 3,
            state: StreamState::Closed,
        };

        observer.on_stream_closed(&NamedConnection("h2-direct"), &stream);

        assert!(!logs_contain("upgrade stream closed"));
    }

    #[traced_test]
    #[test]
    fn configured_upgrade_stream_is_honoured() {
        let config = LifecycleConfig::from_toml_str("upgrade_stream_id = 3").expect("合法配置");
        let observer = StreamCloseObserver::new(&config);
        assert_eq!(observer.upgrade_stream_id(), 3);

        observer.on_stream_closed(
            &NamedConnection("h2c-custom"),
            &StreamSnapshot {
                id: 1,
                state: StreamState::HalfClosedRemote,
            },
        );
        assert!(!logs_contain("upgrade stream closed"));

        observer.on_stream_closed(
            &NamedConnection("h2c-custom"),
            &StreamSnapshot {
                id: 3,
                state: StreamState::HalfClosedRemote,
            },
        );
        assert!(logs_contain("state=HALF_CLOSED_REMOTE"));
    }
}
