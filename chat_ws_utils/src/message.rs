// chat_ws_utils/src/message.rs

//! 入站消息的解码与分类。
//!
//! 服务端推送的每一帧都先尝试按 JSON 解析，再按固定优先级分类：
//! 1. 含 `chat_history` 字段 → [`InboundMessage::HistorySnapshot`]
//! 2. 含 `from` 字段 → [`ChatMessage::Peer`]
//! 3. 其他任意 JSON 值 → [`ChatMessage::Generic`]
//!
//! JSON 解析失败时不视为错误，原始帧原样包装为 [`ChatMessage::Raw`] 交给消息处理器。
//! 同时含有 `chat_history` 与 `from` 的值按上述顺序归为历史快照。
//!
//! 字段是否命中只看键是否存在，与值无关：`{"chat_history": null}` 同样是历史快照，
//! 其值为 `null`。

use chat_models::ws_payloads::{CHAT_HISTORY_KEY, FROM_KEY};
use log::debug;
use serde_json::Value;

/// 未经解码的原始帧内容。
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    /// 文本帧。
    Text(String),
    /// 二进制帧。
    Binary(Vec<u8>),
}

/// 交给消息处理器的聊天消息。
///
/// `Peer` 与 `Generic` 的分发行为完全相同，区分二者只是为了便于处理器自行检查。
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    /// 带有 `from` 字段的对端消息，保存完整的解码值。
    Peer(Value),
    /// 其他可解码的 JSON 值。
    Generic(Value),
    /// 无法按 JSON 解析的原始帧。
    Raw(RawFrame),
}

impl ChatMessage {
    /// 若消息成功解码为 JSON，返回解码后的值。
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ChatMessage::Peer(value) | ChatMessage::Generic(value) => Some(value),
            ChatMessage::Raw(_) => None,
        }
    }

    /// 对端消息中 `from` 字段的字符串值。
    pub fn sender(&self) -> Option<&str> {
        match self {
            ChatMessage::Peer(value) => value.get(FROM_KEY).and_then(Value::as_str),
            _ => None,
        }
    }
}

/// 一帧入站数据解码后的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `chat_history` 字段的值，投递给连接状态处理器。
    HistorySnapshot(Value),
    /// 投递给消息处理器的聊天消息。
    Chat(ChatMessage),
}

impl InboundMessage {
    /// 解码一帧原始数据。此函数不会失败。
    pub fn decode(frame: RawFrame) -> Self {
        let parsed = match &frame {
            RawFrame::Text(text) => serde_json::from_str::<Value>(text),
            RawFrame::Binary(bytes) => serde_json::from_slice::<Value>(bytes),
        };
        match parsed {
            Ok(value) => Self::classify(value),
            Err(e) => {
                debug!("[消息解码] JSON 解析失败，按原始帧透传: {}", e);
                InboundMessage::Chat(ChatMessage::Raw(frame))
            }
        }
    }

    fn classify(mut value: Value) -> Self {
        if let Some(history) = value.get_mut(CHAT_HISTORY_KEY).map(Value::take) {
            return InboundMessage::HistorySnapshot(history);
        }
        if value.get(FROM_KEY).is_some() {
            InboundMessage::Chat(ChatMessage::Peer(value))
        } else {
            InboundMessage::Chat(ChatMessage::Generic(value))
        }
    }
}
