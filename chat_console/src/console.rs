// chat_console/src/console.rs

//! 终端输入解析与事件输出。
//!
//! 输入约定：
//! - `@接收方 消息内容`：发送聊天消息
//! - `/quit` 或 `/exit`：断开连接并退出
//! - `/help`：显示帮助

use crate::error::AppError;
use chat_ws_utils::client::{ConnectionHandler, ErrorHandler, MessageHandler};
use chat_ws_utils::error::WsError;
use chat_ws_utils::message::{ChatMessage, RawFrame};
use chrono::{Local, NaiveTime};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

pub const HELP_TEXT: &str = "用法: @接收方 消息内容 发送消息；/quit 退出；/help 显示帮助";

/// 一行终端输入解析后的命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Send { to: String, message: String },
    Quit,
    Help,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, AppError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }
    if let Some(command) = line.strip_prefix('/') {
        return match command {
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            "help" => Ok(ConsoleCommand::Help),
            other => Err(AppError::InvalidCommand(format!("未知命令 '/{}'。{}", other, HELP_TEXT))),
        };
    }
    let Some(addressed) = line.strip_prefix('@') else {
        return Err(AppError::InvalidCommand(HELP_TEXT.to_string()));
    };
    match addressed.split_once(char::is_whitespace) {
        Some((to, message)) if !to.is_empty() && !message.trim().is_empty() => Ok(ConsoleCommand::Send {
            to: to.to_string(),
            message: message.trim_start().to_string(),
        }),
        _ => Err(AppError::InvalidCommand(format!("缺少接收方或消息内容。{}", HELP_TEXT))),
    }
}

/// 从消息对象中取出适合展示的正文。
fn message_body(value: &Value) -> String {
    ["message", "text"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

pub fn format_chat_message(message: &ChatMessage, at: NaiveTime) -> String {
    let stamp = at.format("%H:%M:%S");
    match message {
        ChatMessage::Peer(value) => {
            let sender = message.sender().map(str::to_string).unwrap_or_else(|| value["from"].to_string());
            format!("[{}] {}: {}", stamp, sender, message_body(value))
        }
        ChatMessage::Generic(value) => format!("[{}] (消息) {}", stamp, value),
        ChatMessage::Raw(RawFrame::Text(text)) => format!("[{}] (原始) {}", stamp, text),
        ChatMessage::Raw(RawFrame::Binary(bytes)) => format!("[{}] (原始二进制 {} 字节)", stamp, bytes.len()),
    }
}

pub fn format_history(history: &Value, at: NaiveTime) -> Vec<String> {
    let stamp = at.format("%H:%M:%S");
    match history.as_array() {
        Some(entries) => {
            let mut lines = vec![format!("[{}] 聊天历史 {} 条", stamp, entries.len())];
            lines.extend(entries.iter().map(|entry| match entry.get("from").and_then(Value::as_str) {
                Some(sender) => format!("    {}: {}", sender, message_body(entry)),
                None => format!("    {}", entry),
            }));
            lines
        }
        None => vec![format!("[{}] 聊天历史: {}", stamp, history)],
    }
}

/// 把适配器事件打印到终端；连接断开时通过 `closed_tx` 通知主循环。
#[derive(Clone)]
pub struct ConsolePrinter {
    closed_tx: UnboundedSender<()>,
}

impl ConsolePrinter {
    pub fn new(closed_tx: UnboundedSender<()>) -> Self {
        Self { closed_tx }
    }
}

impl MessageHandler for ConsolePrinter {
    fn on_message(&self, message: &ChatMessage) {
        println!("{}", format_chat_message(message, Local::now().time()));
    }
}

impl ConnectionHandler for ConsolePrinter {
    fn on_connection_change(&self, connected: bool, chat_history: Option<&Value>) {
        let now = Local::now().time();
        match (connected, chat_history) {
            (true, Some(history)) => {
                for line in format_history(history, now) {
                    println!("{}", line);
                }
            }
            (true, None) => println!("[{}] 已连接", now.format("%H:%M:%S")),
            (false, _) => {
                println!("[{}] 连接已断开", now.format("%H:%M:%S"));
                let _ = self.closed_tx.send(());
            }
        }
    }
}

impl ErrorHandler for ConsolePrinter {
    fn on_error(&self, error: &WsError) {
        eprintln!("[{}] 错误: {}", Local::now().time().format("%H:%M:%S"), error);
    }
}
