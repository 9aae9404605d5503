//! `chat_models` 公共模型库 crate。
//!
//! 集中定义聊天客户端 (`chat_ws_utils`、`chat_console`) 与服务端之间共享的线上数据结构：
//! - **WebSocket 消息负载 (`ws_payloads`)**: 出站 `sendMessage` 负载以及入站消息的关键字段名常量。
//!
//! 所有模型都派生 `Serialize`、`Deserialize`、`Debug`、`Clone`，与其他组件保持一致。

pub mod ws_payloads; // WebSocket 通信中使用的消息负载与协议常量
