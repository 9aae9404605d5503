// chat_ws_utils/src/server/transport.rs

//! 服务端 WebSocket 监听与连接接受。
//!
//! 主要用作聊天客户端的本地对端 (集成测试、联调工具)：绑定地址、完成握手，
//! 然后把每条连接交给调用方提供的异步回调处理。

use crate::error::WsError;
use log::{error, info};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async};

/// 经过 WebSocket 握手后的服务端 TCP 流。
pub type WsStream = WebSocketStream<TcpStream>;

/// 已绑定监听地址的 WebSocket 服务端。
pub struct ServerTransport {
    listener: TcpListener,
}

impl ServerTransport {
    /// 绑定监听地址。端口为 0 时由系统分配，可通过 [`local_addr`](Self::local_addr) 取得。
    pub async fn bind(addr: SocketAddr) -> Result<Self, WsError> {
        let listener = TcpListener::bind(addr).await?;
        info!("[服务端传输] WebSocket 服务器正在监听地址: {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, WsError> {
        Ok(self.listener.local_addr()?)
    }

    /// 持续接受连接。每条连接在独立的 tokio 任务中完成握手并调用 `on_connect`。
    ///
    /// 接受单个连接失败只记录日志，服务器继续运行；此函数不会正常返回。
    pub async fn run<F, Fut>(self, on_connect: F)
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.listener.accept().await {
                Ok((tcp_stream, peer_addr)) => {
                    info!("[服务端传输] 从 {} 接受了新的 TCP 连接", peer_addr);
                    let on_connect_callback = on_connect.clone();
                    tokio::spawn(async move {
                        match accept_async(tcp_stream).await {
                            Ok(ws_stream) => {
                                info!("[服务端传输] 与 {} 的 WebSocket 握手成功", peer_addr);
                                on_connect_callback(ws_stream, peer_addr).await;
                            }
                            Err(e) => {
                                error!("[服务端传输] 与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("[服务端传输] 接受 TCP 连接失败: {}。服务器将继续运行。", e);
                }
            }
        }
    }
}
