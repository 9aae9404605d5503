// chat_ws_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层。
//!
//! 封装 `tokio-tungstenite` 的连接建立、文本帧发送与入站帧读取，
//! 并提供与 WebSocket 标准一致的连接就绪状态 (`ReadyState`)。
//! 上层的 [`ConnectionAdapter`](super::adapter::ConnectionAdapter) 只通过这里的函数与网络打交道。

use crate::error::WsError;
use crate::message::RawFrame;
use futures_util::{
    SinkExt,
    StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_tungstenite::{
    WebSocketStream,
    connect_async,
    tungstenite::Error as TungsteniteError,
    tungstenite::protocol::Message,
};
use url::Url;

/// 可能经过 TLS 加密的客户端 WebSocket 流。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// 连接就绪状态，数值与浏览器 `WebSocket.readyState` 保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "CONNECTING",
            ReadyState::Open => "OPEN",
            ReadyState::Closing => "CLOSING",
            ReadyState::Closed => "CLOSED",
        };
        write!(f, "{} ({})", name, *self as u8)
    }
}

/// 在适配器与连接任务之间共享的就绪状态。
#[derive(Debug, Clone)]
pub struct SharedReadyState(Arc<AtomicU8>);

impl SharedReadyState {
    pub fn new(initial: ReadyState) -> Self {
        SharedReadyState(Arc::new(AtomicU8::new(initial as u8)))
    }

    pub fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ReadyState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// 仅当当前状态为 `from` 时切换到 `to`，返回是否切换成功。
    pub fn transition(&self, from: ReadyState, to: ReadyState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// 一个活动的客户端 WebSocket 连接，持有拆分后的发送端与接收端。
pub struct ClientConnection {
    ws_sender: SplitSink<ClientWsStream, Message>,
    ws_receiver: SplitStream<ClientWsStream>,
}

impl ClientConnection {
    /// 发送一个文本帧。
    pub async fn send_text(&mut self, text: String) -> Result<(), WsError> {
        debug!("[客户端传输] 准备发送文本帧: {}", text);
        self.ws_sender.send(Message::Text(text)).await?;
        Ok(())
    }

    /// 发起关闭握手。之后仍应继续调用 [`receive_frame`](Self::receive_frame)
    /// 直到返回 `None`，以完成握手。
    pub async fn close(&mut self) -> Result<(), WsError> {
        info!("[客户端传输] 发送 Close 帧，请求关闭连接。");
        match self.ws_sender.send(Message::Close(None)).await {
            Ok(()) => Ok(()),
            Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed) => Ok(()),
            Err(e) => Err(WsError::WebSocketProtocolError(e)),
        }
    }

    /// 读取下一个业务帧 (文本或二进制)。
    ///
    /// Ping/Pong 由 `tokio-tungstenite` 自动处理，这里直接跳过。
    /// 返回 `None` 表示连接已关闭。
    pub async fn receive_frame(&mut self) -> Option<Result<RawFrame, WsError>> {
        loop {
            match self.ws_receiver.next().await {
                Some(Ok(msg)) => match msg {
                    Message::Text(text) => {
                        debug!("[客户端传输] 收到原始文本帧: '{}'", text);
                        break Some(Ok(RawFrame::Text(text)));
                    }
                    Message::Binary(bin) => {
                        debug!("[客户端传输] 收到二进制帧，长度: {} 字节", bin.len());
                        break Some(Ok(RawFrame::Binary(bin)));
                    }
                    Message::Ping(ping_data) => {
                        debug!("[客户端传输] 收到 Ping 控制帧，数据: {:?}", ping_data);
                    }
                    Message::Pong(pong_data) => {
                        debug!("[客户端传输] 收到 Pong 控制帧，数据: {:?}", pong_data);
                    }
                    Message::Close(close_frame) => {
                        // 关闭握手由底层库自动回应，继续读取直到流结束
                        debug!("[客户端传输] 收到 Close 控制帧: {:?}", close_frame);
                    }
                    Message::Frame(_) => {
                        debug!("[客户端传输] 收到底层原始 Frame，跳过。");
                    }
                },
                Some(Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed)) => {
                    debug!("[客户端传输] 连接已关闭 (ConnectionClosed/AlreadyClosed)。");
                    break None;
                }
                Some(Err(e)) => {
                    error!("[客户端传输] 读取 WebSocket 流时发生错误: {}", e);
                    break Some(Err(WsError::WebSocketProtocolError(e)));
                }
                None => {
                    debug!("[客户端传输] WebSocket 接收流已结束。");
                    break None;
                }
            }
        }
    }
}

/// 校验地址是否为合法的 `ws://` 或 `wss://` URL。
///
/// 这一步是同步的，失败时连接任务根本不会启动。
pub fn parse_ws_url(url_str: &str) -> Result<Url, WsError> {
    let parsed_url = Url::parse(url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;
    match parsed_url.scheme() {
        "ws" | "wss" => Ok(parsed_url),
        other => Err(WsError::InvalidUrl(format!(
            "URL '{}' 的协议 '{}' 不是 ws 或 wss",
            url_str, other
        ))),
    }
}

/// 异步连接到 WebSocket 服务器并完成握手。
pub async fn connect_client(url: &Url) -> Result<ClientConnection, WsError> {
    info!("[客户端传输] 开始连接 WebSocket 服务器: {}", url);
    match connect_async(url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("[客户端传输] 已连接到 {} (HTTP 状态码: {})", url, response.status());
            debug!("[客户端传输] 握手响应头: {:?}", response.headers());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("[客户端传输] 连接到 {} 失败: {}", url, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}
