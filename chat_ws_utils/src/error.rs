// chat_ws_utils/src/error.rs

//! 定义聊天 WebSocket 工具库的错误类型。

use thiserror::Error;

/// 聊天 WebSocket 工具库的统一错误类型。
///
/// 客户端适配器不会把这些错误返回给调用方，而是投递给已注册的错误处理器；
/// 服务端传输层与底层连接函数则通过 `Result` 正常返回。
#[derive(Error, Debug)]
pub enum WsError {
    /// 出站负载序列化为 JSON 失败。
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// WebSocket 协议相关的错误，包括握手失败、读写失败等。
    #[error("WebSocket协议错误: {0}")]
    WebSocketProtocolError(#[from] tokio_tungstenite::tungstenite::Error),

    /// 底层 I/O 错误 (例如服务端监听器绑定失败)。
    #[error("I/O错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 无效的 URL，或者不是 ws/wss 协议。
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    /// 当前线程没有可用的 tokio 运行时，无法驱动连接任务。
    #[error("运行时不可用: {0}")]
    RuntimeUnavailable(String),
}
