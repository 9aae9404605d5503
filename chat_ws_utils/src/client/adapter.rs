// chat_ws_utils/src/client/adapter.rs

//! 聊天连接适配器。
//!
//! `ConnectionAdapter` 持有一个 WebSocket 连接，把底层的打开、消息、关闭、错误事件
//! 转换为对三类已注册处理器的调用，并在连接处于 `Open` 状态时发送 `sendMessage` 负载。
//!
//! 每次 `connect()` 都会派生一个独立的 tokio 任务，它是该连接上所有事件的唯一消费者：
//! 既从套接字读取入站帧，也从命令通道读取待发送的帧与关闭请求。
//! 因此同一连接的两次事件分发不会重叠，处理器总是按注册顺序同步执行。
//!
//! 适配器本身不做重连、不缓存断线期间的消息，也不提供送达确认。

use crate::client::handlers::{ConnectionHandler, ErrorHandler, HandlerRegistry, MessageHandler};
use crate::client::transport::{ReadyState, SharedReadyState, connect_client, parse_ws_url};
use crate::error::WsError;
use crate::message::{ChatMessage, InboundMessage, RawFrame};
use chat_models::ws_payloads::SendMessagePayload;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// 适配器发给连接任务的命令。
#[derive(Debug)]
enum TransportCommand {
    Send(String),
    Close,
}

/// 适配器对当前连接任务的句柄。
struct ConnectionHandle {
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    ready_state: SharedReadyState,
}

impl ConnectionHandle {
    /// 请求关闭；已处于 `Closing`/`Closed` 时什么也不做。
    fn request_close(&self) {
        let closing = self.ready_state.transition(ReadyState::Open, ReadyState::Closing)
            || self.ready_state.transition(ReadyState::Connecting, ReadyState::Closing);
        if closing && self.command_tx.send(TransportCommand::Close).is_err() {
            debug!("[聊天客户端] 连接任务已退出，无需再发送关闭命令。");
        }
    }
}

/// 单个聊天会话的客户端连接适配器。
pub struct ConnectionAdapter {
    url: String,
    session_id: String,
    handlers: Arc<HandlerRegistry>,
    connection: Option<ConnectionHandle>,
}

impl ConnectionAdapter {
    /// 创建适配器。地址与会话标识原样保存，不做任何校验。
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            handlers: Arc::new(HandlerRegistry::new()),
            connection: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 打开到已保存地址的新连接。
    ///
    /// 地址不是合法的 `ws://`/`wss://` URL，或当前线程没有 tokio 运行时时，
    /// 错误会同步投递给错误处理器，连接状态处理器不会被调用。
    /// 其余所有事件都在连接任务中异步分发。
    ///
    /// 若已存在连接，旧连接会先被请求关闭，适配器始终只持有一个连接。
    pub fn connect(&mut self) {
        info!("[聊天客户端] 尝试连接到: {}", self.url);

        let parsed_url = match parse_ws_url(&self.url) {
            Ok(url) => url,
            Err(e) => {
                error!("[聊天客户端] 创建 WebSocket 连接失败: {}", e);
                self.handlers.dispatch_error(&e);
                return;
            }
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let err = WsError::RuntimeUnavailable(e.to_string());
                error!("[聊天客户端] 创建 WebSocket 连接失败: {}", err);
                self.handlers.dispatch_error(&err);
                return;
            }
        };

        if let Some(previous) = self.connection.take() {
            warn!("[聊天客户端] 已存在连接 (状态: {})，先请求关闭旧连接。", previous.ready_state.get());
            previous.request_close();
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let ready_state = SharedReadyState::new(ReadyState::Connecting);
        runtime.spawn(run_connection(
            parsed_url,
            ready_state.clone(),
            command_rx,
            self.handlers.clone(),
        ));
        self.connection = Some(ConnectionHandle { command_tx, ready_state });
    }

    /// 向 `to` 发送一条聊天消息。
    ///
    /// 只有连接存在且处于 `Open` 状态时才会发送；否则只记录一条警告日志，
    /// 不返回错误，也不会缓存消息。返回值表示帧是否已交给连接任务。
    pub fn send_message(&self, to: &str, message: &str) -> bool {
        let Some(connection) = self.connection.as_ref() else {
            warn!("[聊天客户端] 无法发送消息: WebSocket 未打开。当前状态: 无连接");
            return false;
        };
        let state = connection.ready_state.get();
        if state != ReadyState::Open {
            warn!("[聊天客户端] 无法发送消息: WebSocket 未打开。当前状态: {}", state);
            return false;
        }

        let payload = SendMessagePayload::new(to, message, &self.session_id);
        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(e) => {
                let err = WsError::SerializationError(format!("序列化 sendMessage 负载失败: {}", e));
                error!("[聊天客户端] {}", err);
                self.handlers.dispatch_error(&err);
                return false;
            }
        };
        info!("[聊天客户端] 发送消息负载: {}", text);
        if connection.command_tx.send(TransportCommand::Send(text)).is_err() {
            warn!("[聊天客户端] 无法发送消息: 连接任务已退出。");
            return false;
        }
        true
    }

    pub fn add_message_handler(&self, handler: impl MessageHandler + 'static) {
        self.handlers.add_message_handler(Arc::new(handler));
    }

    pub fn add_connection_handler(&self, handler: impl ConnectionHandler + 'static) {
        self.handlers.add_connection_handler(Arc::new(handler));
    }

    pub fn add_error_handler(&self, handler: impl ErrorHandler + 'static) {
        self.handlers.add_error_handler(Arc::new(handler));
    }

    /// 请求关闭当前连接。关闭完成后连接状态处理器会收到 `(false, None)`。
    ///
    /// 已经被连接任务读取的入站帧在调用之后仍可能被分发。
    pub fn disconnect(&self) {
        if let Some(connection) = &self.connection {
            info!("[聊天客户端] 正在断开 WebSocket 连接");
            connection.request_close();
        }
    }

    /// 当前连接的就绪状态；从未调用过 `connect()` 时为 `None`。
    pub fn ready_state(&self) -> Option<ReadyState> {
        self.connection.as_ref().map(|connection| connection.ready_state.get())
    }

    pub fn is_open(&self) -> bool {
        self.ready_state() == Some(ReadyState::Open)
    }
}

/// 单个连接的事件循环。
async fn run_connection(
    url: Url,
    ready_state: SharedReadyState,
    mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    handlers: Arc<HandlerRegistry>,
) {
    let mut connection = match connect_client(&url).await {
        Ok(connection) => connection,
        Err(e) => {
            ready_state.set(ReadyState::Closed);
            error!("[聊天客户端] WebSocket 错误: {}", e);
            handlers.dispatch_error(&e);
            info!("[聊天客户端] WebSocket 连接已关闭 (握手未完成)");
            handlers.dispatch_connection(false, None);
            return;
        }
    };

    if ready_state.transition(ReadyState::Connecting, ReadyState::Open) {
        info!("[聊天客户端] WebSocket 连接已建立");
        handlers.dispatch_connection(true, None);
    } else {
        // 握手期间已调用 disconnect()，不再报告打开事件
        info!("[聊天客户端] 握手完成前已请求断开，直接关闭连接。");
        if let Err(e) = connection.close().await {
            warn!("[聊天客户端] 关闭连接时出错: {}", e);
        }
        ready_state.set(ReadyState::Closed);
        handlers.dispatch_connection(false, None);
        return;
    }

    let mut accepting_commands = true;
    loop {
        tokio::select! {
            command = command_rx.recv(), if accepting_commands => match command {
                Some(TransportCommand::Send(text)) => {
                    if let Err(e) = connection.send_text(text).await {
                        error!("[聊天客户端] WebSocket 错误: 发送失败: {}", e);
                        handlers.dispatch_error(&e);
                    }
                }
                Some(TransportCommand::Close) | None => {
                    // None 表示适配器已被丢弃
                    accepting_commands = false;
                    ready_state.set(ReadyState::Closing);
                    if let Err(e) = connection.close().await {
                        error!("[聊天客户端] WebSocket 错误: 关闭失败: {}", e);
                        handlers.dispatch_error(&e);
                        break;
                    }
                }
            },
            frame = connection.receive_frame() => match frame {
                Some(Ok(raw_frame)) => dispatch_inbound(&handlers, raw_frame),
                Some(Err(e)) => {
                    error!("[聊天客户端] WebSocket 错误: {}", e);
                    handlers.dispatch_error(&e);
                    break;
                }
                None => break,
            },
        }
    }

    ready_state.set(ReadyState::Closed);
    info!("[聊天客户端] WebSocket 连接已关闭");
    handlers.dispatch_connection(false, None);
}

fn dispatch_inbound(handlers: &HandlerRegistry, frame: RawFrame) {
    match InboundMessage::decode(frame) {
        InboundMessage::HistorySnapshot(history) => {
            info!("[聊天客户端] 收到聊天历史: {}", history);
            handlers.dispatch_connection(true, Some(&history));
        }
        InboundMessage::Chat(message) => {
            match &message {
                ChatMessage::Peer(value) => info!("[聊天客户端] 收到聊天消息: {}", value),
                ChatMessage::Generic(value) => info!("[聊天客户端] 收到其他类型消息: {}", value),
                ChatMessage::Raw(raw) => warn!("[聊天客户端] 消息解析失败，按原始内容分发: {:?}", raw),
            }
            handlers.dispatch_message(&message);
        }
    }
}
