use bytes::Bytes;
use core::fmt;

use crate::error_code::ShutdownClassification;

/// 流标识的保留位掩码：HTTP/2 流 ID 只使用低 31 位。
pub const STREAM_ID_MASK: u32 = 0x7fff_ffff;

/// 已由帧编解码器解析完毕的 GOAWAY 字段。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 帧编解码器不属于本 crate，协调器只需要 GOAWAY 的三个语义字段；
/// - 以值类型承载，便于连接处理器在发送与接收两条路径上复用同一结构。
///
/// ## 契约（What）
/// - `last_stream_id`：构造时屏蔽最高保留位，始终落在 31 位范围内；
/// - `error_code`：原始数值，分类见 [`ShutdownClassification`]；
/// - `debug_data`：不透明字节，仅在日志中按 UTF-8 有损解码。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoAwaySignal {
    last_stream_id: u32,
    error_code: u32,
    debug_data: Bytes,
}

impl GoAwaySignal {
    /// 构造携带调试数据的 GOAWAY。
    pub fn new(last_stream_id: u32, error_code: u32, debug_data: impl Into<Bytes>) -> Self {
        Self {
            last_stream_id: last_stream_id & STREAM_ID_MASK,
            error_code,
            debug_data: debug_data.into(),
        }
    }

    /// 构造不带调试数据的 GOAWAY。
    pub fn without_debug_data(last_stream_id: u32, error_code: u32) -> Self {
        Self::new(last_stream_id, error_code, Bytes::new())
    }

    pub fn last_stream_id(&self) -> u32 {
        self.last_stream_id
    }

    pub fn error_code(&self) -> u32 {
        self.error_code
    }

    pub fn debug_data(&self) -> &Bytes {
        &self.debug_data
    }

    /// 错误码分类。
    pub fn classification(&self) -> ShutdownClassification {
        ShutdownClassification::of(self.error_code)
    }

    /// 以有损 UTF-8 渲染调试数据，最多保留 `limit` 字节。
    pub fn debug_text(&self, limit: usize) -> String {
        render_debug_data(&self.debug_data, limit)
    }
}

/// GOAWAY 的方向：本端发出或对端发来。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GoAwayDirection {
    Sent,
    Received,
}

impl fmt::Display for GoAwayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoAwayDirection::Sent => f.write_str("Sent"),
            GoAwayDirection::Received => f.write_str("Received"),
        }
    }
}

// 截断可能切开多字节字符，由替换字符兜底。
fn render_debug_data(data: &[u8], limit: usize) -> String {
    let end = data.len().min(limit);
    let mut text = String::from_utf8_lossy(&data[..end]).into_owned();
    if data.len() > limit {
        text.push_str("...");
    }
    text
}
