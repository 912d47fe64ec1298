use std::borrow::Cow;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use spark_lifecycle::{
    ConnectionHandle, GoAwaySignal, LastStreamIdPolicy, LifecycleConfig, ShutdownCoordinator,
    ShutdownPhase, StreamCloseObserver, StreamSnapshot, StreamState,
};

/// 记录关闭请求的连接桩，模拟连接处理器“收到关闭请求后回送 GOAWAY”的行为。
#[derive(Default)]
struct RecordingConnection {
    closes: AtomicUsize,
    events: Mutex<Vec<&'static str>>,
}

impl RecordingConnection {
    fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl ConnectionHandle for RecordingConnection {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed("[id: 0x0001, L:127.0.0.1:8080 - R:127.0.0.1:50000]")
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push("close");
    }
}

fn clean(last_stream_id: u32) -> GoAwaySignal {
    GoAwaySignal::without_debug_data(last_stream_id, 0)
}

/// 验证对端先发起时，本端请求关闭并在回送 GOAWAY 后收敛。
#[test]
fn remote_initiated_shutdown_converges() {
    let conn = RecordingConnection::default();
    let mut coordinator = ShutdownCoordinator::default();

    coordinator.on_go_away_received(&conn, &clean(5));
    assert_eq!(conn.close_count(), 1);
    assert_eq!(coordinator.phase(), ShutdownPhase::RemoteSignalReceived);

    // 连接句柄执行关闭时发出自己的 GOAWAY。
    coordinator.on_go_away_sent(&conn, &clean(0));
    assert_eq!(coordinator.phase(), ShutdownPhase::Converged);
    assert_eq!(conn.events(), vec!["close"]);
}

/// 验证本端先发起时，对端的回应不会触发额外关闭。
#[test]
fn local_initiated_shutdown_does_not_close_twice() {
    let conn = RecordingConnection::default();
    let mut coordinator = ShutdownCoordinator::default();

    coordinator.on_go_away_sent(&conn, &GoAwaySignal::new(7, 0, "draining"));
    coordinator.on_go_away_sent(&conn, &GoAwaySignal::new(7, 0, "draining"));
    assert!(coordinator.has_sent_go_away());

    coordinator.on_go_away_received(&conn, &clean(0));
    assert_eq!(conn.close_count(), 0);
    assert_eq!(coordinator.phase(), ShutdownPhase::Converged);
}

/// 验证错误码分类对查询接口的影响。
#[test]
fn error_classification_drives_queries() {
    let conn = RecordingConnection::default();

    let mut clean_side = ShutdownCoordinator::default();
    clean_side.on_go_away_received(&conn, &clean(10));
    assert!(!clean_side.has_received_error_go_away());

    let mut protocol_error = ShutdownCoordinator::default();
    protocol_error.on_go_away_received(&conn, &GoAwaySignal::without_debug_data(10, 1));
    assert!(protocol_error.has_received_error_go_away());

    let mut unknown = ShutdownCoordinator::default();
    unknown.on_go_away_received(&conn, &GoAwaySignal::without_debug_data(1, 0xFFFF_FFF0));
    assert!(unknown.has_received_error_go_away());
    assert_eq!(unknown.state().received_error_code(), Some(0xFFFF_FFF0));

    assert_eq!(conn.close_count(), 3);
}

/// 验证开放问题的两种策略都按声明工作。
#[test]
fn last_stream_id_policies() {
    let conn = RecordingConnection::default();

    let mut narrow = ShutdownCoordinator::new(&LifecycleConfig::default());
    narrow.on_go_away_received(&conn, &clean(3));
    narrow.on_go_away_received(&conn, &clean(101));
    assert_eq!(narrow.state().last_stream_id_observed(), Some(3));

    let config = LifecycleConfig::from_toml_str(r#"last_stream_id_policy = "last_write_wins""#)
        .expect("合法配置");
    assert_eq!(config.last_stream_id_policy, LastStreamIdPolicy::LastWriteWins);
    let mut overwrite = ShutdownCoordinator::new(&config);
    overwrite.on_go_away_received(&conn, &clean(3));
    overwrite.on_go_away_received(&conn, &clean(101));
    assert_eq!(overwrite.state().last_stream_id_observed(), Some(101));
}

/// 验证探针与协调器观察到一致的最终状态。
#[test]
fn probe_reflects_converged_state() {
    let conn = RecordingConnection::default();
    let mut coordinator = ShutdownCoordinator::default();
    let probe = coordinator.probe();

    coordinator.on_go_away_sent(&conn, &GoAwaySignal::without_debug_data(9, 2));
    assert!(probe.has_sent_go_away());
    assert!(!probe.has_received_go_away());
    assert_eq!(probe.last_stream_id_observed(), None);

    coordinator.on_go_away_received(&conn, &clean(9));
    assert_eq!(probe.phase(), ShutdownPhase::Converged);
    assert!(!probe.has_received_error_go_away());
    assert_eq!(probe.last_stream_id_observed(), Some(9));
}

/// 观察者对任意流都不应影响连接。
#[test]
fn stream_observer_never_touches_connection() {
    let conn = RecordingConnection::default();
    let observer = StreamCloseObserver::default();

    for id in [1, 3, 5] {
        observer.on_stream_closed(
            &conn,
            &StreamSnapshot {
                id,
                state: StreamState::Closed,
            },
        );
    }
    assert_eq!(conn.close_count(), 0);
}
