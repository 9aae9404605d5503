// chat_ws_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! - `transport`: 封装 `tokio-tungstenite`，负责连接建立、帧收发与就绪状态。
//! - `handlers`: 消息、连接状态、错误三类处理器 trait 及其注册表。
//! - `adapter`: `ConnectionAdapter`，把传输层事件广播给处理器并发送聊天消息。

pub mod adapter;
pub mod handlers;
pub mod transport;

pub use adapter::ConnectionAdapter;
pub use handlers::{ConnectionHandler, ErrorHandler, MessageHandler};
pub use transport::ReadyState;
