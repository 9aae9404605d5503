// chat_ws_utils/tests/common/mod.rs

//! 集成测试共用的辅助设施：可脚本化的本地聊天对端，以及记录适配器事件的处理器。

#![allow(dead_code)]

use chat_ws_utils::client::ConnectionAdapter;
use chat_ws_utils::error::WsError;
use chat_ws_utils::message::ChatMessage;
use chat_ws_utils::server::transport::{ServerTransport, WsStream};
use futures_util::{SinkExt, StreamExt};
use log::{LevelFilter, info};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;

/// 单个事件的最长等待时间。
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_test_logger() {
    let _ = env_logger::builder().filter_level(LevelFilter::Debug).is_test(true).try_init();
}

/// 测试代码驱动对端的命令。
pub enum PeerCommand {
    Send(TungsteniteMessage),
    Close,
    /// 不发送 Close 帧，直接丢弃 TCP 连接。
    Abort,
}

/// 本地聊天对端：记录客户端发来的文本帧，并按测试指令推送帧或关闭连接。
///
/// 测试指令只作用于第一条连接，之后的连接只被动接收。
pub struct ScriptedPeer {
    pub url: String,
    pub received_rx: UnboundedReceiver<String>,
    pub command_tx: UnboundedSender<PeerCommand>,
    pub closed_rx: UnboundedReceiver<SocketAddr>,
    server_handle: JoinHandle<()>,
}

impl ScriptedPeer {
    pub fn push_text(&self, text: &str) {
        self.command_tx
            .send(PeerCommand::Send(TungsteniteMessage::Text(text.to_string())))
            .expect("对端命令通道已关闭");
    }

    pub fn push_binary(&self, bytes: Vec<u8>) {
        self.command_tx
            .send(PeerCommand::Send(TungsteniteMessage::Binary(bytes)))
            .expect("对端命令通道已关闭");
    }

    pub fn close(&self) {
        self.command_tx.send(PeerCommand::Close).expect("对端命令通道已关闭");
    }

    pub fn abort(&self) {
        self.command_tx.send(PeerCommand::Abort).expect("对端命令通道已关闭");
    }

    pub async fn next_received(&mut self) -> String {
        timeout(EVENT_TIMEOUT, self.received_rx.recv())
            .await
            .expect("等待客户端发送帧超时")
            .expect("对端接收通道已关闭")
    }

    pub async fn wait_closed(&mut self) -> SocketAddr {
        timeout(EVENT_TIMEOUT, self.closed_rx.recv())
            .await
            .expect("等待对端连接关闭超时")
            .expect("对端关闭通知通道已关闭")
    }
}

impl Drop for ScriptedPeer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_scripted_peer() -> ScriptedPeer {
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().expect("无效的测试绑定地址");
    let server = ServerTransport::bind(bind_addr).await.expect("测试服务端绑定失败");
    let addr = server.local_addr().expect("无法获取测试服务端地址");

    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();
    let command_rx = Arc::new(Mutex::new(Some(command_rx)));

    let server_handle = tokio::spawn(server.run(move |ws_stream: WsStream, peer_addr: SocketAddr| {
        let received_tx = received_tx.clone();
        let closed_tx = closed_tx.clone();
        let command_rx = command_rx.clone();
        async move {
            let commands = command_rx.lock().await.take();
            serve_connection(ws_stream, commands, received_tx).await;
            info!("[测试对端] 与 {} 的连接处理结束", peer_addr);
            let _ = closed_tx.send(peer_addr);
        }
    }));

    ScriptedPeer {
        url: format!("ws://{}/chat", addr),
        received_rx,
        command_tx,
        closed_rx,
        server_handle,
    }
}

async fn serve_connection(
    ws_stream: WsStream,
    commands: Option<UnboundedReceiver<PeerCommand>>,
    received_tx: UnboundedSender<String>,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let mut accepting_commands = commands.is_some();
    let mut commands = commands.unwrap_or_else(|| mpsc::unbounded_channel().1);
    loop {
        tokio::select! {
            command = commands.recv(), if accepting_commands => match command {
                Some(PeerCommand::Send(message)) => {
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                Some(PeerCommand::Close) | None => {
                    accepting_commands = false;
                    let _ = sink.send(TungsteniteMessage::Close(None)).await;
                }
                Some(PeerCommand::Abort) => {
                    info!("[测试对端] 未经关闭握手直接断开连接");
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(TungsteniteMessage::Text(text))) => {
                    info!("[测试对端] 收到客户端文本帧: {}", text);
                    let _ = received_tx.send(text);
                }
                Some(Ok(other)) => info!("[测试对端] 收到其他帧: {:?}", other),
                Some(Err(_)) | None => break,
            },
        }
    }
}

/// 适配器处理器观察到的事件，带上处理器编号以便校验调用顺序。
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    Connection { handler: usize, connected: bool, history: Option<Value> },
    Message { handler: usize, message: ChatMessage },
    Error { handler: usize, description: String },
}

/// 为三类处理器各注册 `per_kind` 个记录器，返回事件接收端。
pub fn record_events(adapter: &ConnectionAdapter, per_kind: usize) -> UnboundedReceiver<AdapterEvent> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    for handler in 0..per_kind {
        let tx = event_tx.clone();
        adapter.add_connection_handler(move |connected: bool, history: Option<&Value>| {
            let _ = tx.send(AdapterEvent::Connection { handler, connected, history: history.cloned() });
        });
        let tx = event_tx.clone();
        adapter.add_message_handler(move |message: &ChatMessage| {
            let _ = tx.send(AdapterEvent::Message { handler, message: message.clone() });
        });
        let tx = event_tx.clone();
        adapter.add_error_handler(move |error: &WsError| {
            let _ = tx.send(AdapterEvent::Error { handler, description: error.to_string() });
        });
    }
    event_rx
}

pub async fn next_event(event_rx: &mut UnboundedReceiver<AdapterEvent>) -> AdapterEvent {
    timeout(EVENT_TIMEOUT, event_rx.recv())
        .await
        .expect("等待适配器事件超时")
        .expect("适配器事件通道已关闭")
}

pub async fn expect_connection(event_rx: &mut UnboundedReceiver<AdapterEvent>, per_kind: usize, connected: bool) {
    for handler in 0..per_kind {
        assert_eq!(
            next_event(event_rx).await,
            AdapterEvent::Connection { handler, connected, history: None },
            "连接状态处理器 {} 应收到 ({})",
            handler,
            connected
        );
    }
}
