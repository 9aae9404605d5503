// chat_models/src/ws_payloads.rs

//! 聊天 WebSocket 通信中使用的 Payload 结构体与协议常量。
//!
//! 出站方向只有一种固定结构 (`SendMessagePayload`)；入站方向不强制任何 schema，
//! 仅通过 `chat_history` 与 `from` 两个字段名区分消息类别。

use serde::{Deserialize, Serialize};

/// 发送聊天消息时 `action` 字段的固定取值。
pub const SEND_MESSAGE_ACTION: &str = "sendMessage";

/// 入站消息中表示"历史消息快照"的字段名。
pub const CHAT_HISTORY_KEY: &str = "chat_history";

/// 入站消息中表示"来自某个对端的聊天消息"的字段名。
pub const FROM_KEY: &str = "from";

/// 客户端发往服务端的聊天消息负载。
///
/// 序列化后的字段顺序固定为 `action`, `to`, `message`, `session_id`，
/// 服务端按此结构解析，不要随意调整字段声明顺序。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SendMessagePayload {
    /// 固定为 [`SEND_MESSAGE_ACTION`]。
    pub action: String,
    /// 接收方标识。
    pub to: String,
    /// 消息正文。
    pub message: String,
    /// 会话标识，原样透传，不做校验。
    pub session_id: String,
}

impl SendMessagePayload {
    /// 构造一条 `sendMessage` 负载，`action` 字段自动填充。
    pub fn new(to: &str, message: &str, session_id: &str) -> Self {
        Self {
            action: SEND_MESSAGE_ACTION.to_string(),
            to: to.to_string(),
            message: message.to_string(),
            session_id: session_id.to_string(),
        }
    }
}
