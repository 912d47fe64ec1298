//! GOAWAY 错误码注册表与关闭信号分类。
//!
//! # 教案式导航
//! - **定位（Where）**：被 [`crate::coordinator`] 用于决定日志级别与字段渲染，本身不持有状态；
//! - **动机（Why）**：清洁关闭（`NO_ERROR`）属于日常运维噪声，非零错误码通常意味着协议违规、过载或
//!   对端崩溃，需要运维关注，因此分类结果直接映射为日志级别；
//! - **契约（What）**：任何 `u32` 输入都能得到分类结果，未注册的错误码归一化为
//!   [`ShutdownClassification::Unrecognized`]，绝不向外抛错。

use core::fmt;

use tracing::Level;

/// RFC 9113 §7 定义的 HTTP/2 错误码。
///
/// 数值与线上编码一一对应，`Display` 输出规范名称（如 `PROTOCOL_ERROR`）。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum Http2ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl Http2ErrorCode {
    /// 根据线上数值查找已注册的错误码，未注册时返回 `None`。
    pub fn from_code(code: u32) -> Option<Self> {
        let known = match code {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            _ => return None,
        };
        Some(known)
    }

    /// 线上数值。
    pub fn code(self) -> u32 {
        self as u32
    }

    /// 规范名称。
    pub fn name(self) -> &'static str {
        match self {
            Self::NoError => "NO_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::FlowControlError => "FLOW_CONTROL_ERROR",
            Self::SettingsTimeout => "SETTINGS_TIMEOUT",
            Self::StreamClosed => "STREAM_CLOSED",
            Self::FrameSizeError => "FRAME_SIZE_ERROR",
            Self::RefusedStream => "REFUSED_STREAM",
            Self::Cancel => "CANCEL",
            Self::CompressionError => "COMPRESSION_ERROR",
            Self::ConnectError => "CONNECT_ERROR",
            Self::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            Self::InadequateSecurity => "INADEQUATE_SECURITY",
            Self::Http11Required => "HTTP_1_1_REQUIRED",
        }
    }
}

impl fmt::Display for Http2ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个 GOAWAY 事件的分类结果。
///
/// # 教案式说明
/// - **意图 (Why)**：把“是否需要运维关注”编码进类型，日志级别与字段集合由分类唯一决定；
/// - **契约 (What)**：
///   - `Clean`：错误码为 0，DEBUG 级别；
///   - `Abnormal`：非零且已注册，WARN 级别，渲染为 `NAME(code)`；
///   - `Unrecognized`：非零且未注册，WARN 级别，渲染为 `UNKNOWN(code)`；
/// - **风险 (Trade-offs)**：注册表固定为 RFC 9113 的取值，扩展错误码只会落入 `Unrecognized`，
///   不影响协调器的正确性。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShutdownClassification {
    Clean,
    Abnormal(Http2ErrorCode),
    Unrecognized(u32),
}

impl ShutdownClassification {
    /// 对原始错误码分类。
    pub fn of(code: u32) -> Self {
        match Http2ErrorCode::from_code(code) {
            Some(Http2ErrorCode::NoError) => Self::Clean,
            Some(known) => Self::Abnormal(known),
            None => Self::Unrecognized(code),
        }
    }

    /// 原始错误码。
    pub fn code(self) -> u32 {
        match self {
            Self::Clean => Http2ErrorCode::NoError.code(),
            Self::Abnormal(known) => known.code(),
            Self::Unrecognized(code) => code,
        }
    }

    /// 是否为非零错误码。
    pub fn is_error(self) -> bool {
        !matches!(self, Self::Clean)
    }

    /// 该事件应使用的日志级别。
    pub fn level(self) -> Level {
        if self.is_error() {
            Level::WARN
        } else {
            Level::DEBUG
        }
    }
}

impl fmt::Display for ShutdownClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "{}(0)", Http2ErrorCode::NoError),
            Self::Abnormal(known) => write!(f, "{}({})", known, known.code()),
            Self::Unrecognized(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}
