// chat_ws_utils/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! `transport` 子模块提供监听、握手与按连接回调的最小服务端实现，
//! 供集成测试和本地联调时充当聊天服务端。

pub mod transport;
