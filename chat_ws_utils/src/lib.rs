//! `chat_ws_utils` 是聊天客户端的 WebSocket 工具 crate。
//!
//! 主要模块：
//! - `client`: `ConnectionAdapter` 及其处理器、客户端传输层。
//! - `message`: 入站帧的 JSON 解码与分类 (`InboundMessage`, `ChatMessage`)。
//! - `error`: 统一错误类型 `WsError`。
//! - `server`: 最小的服务端传输层，用于测试与本地联调。
//!
//! ```no_run
//! use chat_ws_utils::client::ConnectionAdapter;
//! use chat_ws_utils::message::ChatMessage;
//!
//! # #[tokio::main] async fn main() {
//! let mut adapter = ConnectionAdapter::new("ws://127.0.0.1:8088/chat", "s1");
//! adapter.add_message_handler(|message: &ChatMessage| println!("{:?}", message));
//! adapter.connect();
//! # }
//! ```

pub mod client;
pub mod error;
pub mod message;
pub mod server;
