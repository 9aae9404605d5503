// chat_ws_utils/src/client/handlers.rs

//! 客户端事件处理器。
//!
//! 三类处理器各自维护一个只增不减的列表，事件按注册顺序依次广播。
//! 任意签名匹配的闭包都自动实现对应的 trait，可直接注册。

use crate::error::WsError;
use crate::message::ChatMessage;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// 聊天消息处理器。
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: &ChatMessage);
}

/// 连接状态处理器。
///
/// `connected` 为 `true` 时，`chat_history` 可能携带服务端推送的历史快照；
/// 连接建立与断开时它始终为 `None`。
pub trait ConnectionHandler: Send + Sync {
    fn on_connection_change(&self, connected: bool, chat_history: Option<&Value>);
}

/// 错误处理器。
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, error: &WsError);
}

impl<F> MessageHandler for F
where
    F: Fn(&ChatMessage) + Send + Sync,
{
    fn on_message(&self, message: &ChatMessage) {
        self(message)
    }
}

impl<F> ConnectionHandler for F
where
    F: Fn(bool, Option<&Value>) + Send + Sync,
{
    fn on_connection_change(&self, connected: bool, chat_history: Option<&Value>) {
        self(connected, chat_history)
    }
}

impl<F> ErrorHandler for F
where
    F: Fn(&WsError) + Send + Sync,
{
    fn on_error(&self, error: &WsError) {
        self(error)
    }
}

/// 三类处理器列表，由适配器与连接任务共享。
///
/// 广播时先在读锁内复制一份 `Arc` 快照，再在锁外调用处理器，
/// 因此处理器内部可以安全地继续注册新的处理器。
#[derive(Default)]
pub struct HandlerRegistry {
    message_handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
    connection_handlers: RwLock<Vec<Arc<dyn ConnectionHandler>>>,
    error_handlers: RwLock<Vec<Arc<dyn ErrorHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message_handler(&self, handler: Arc<dyn MessageHandler>) {
        append(&self.message_handlers, handler);
    }

    pub fn add_connection_handler(&self, handler: Arc<dyn ConnectionHandler>) {
        append(&self.connection_handlers, handler);
    }

    pub fn add_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        append(&self.error_handlers, handler);
    }

    pub fn dispatch_message(&self, message: &ChatMessage) {
        for handler in snapshot(&self.message_handlers) {
            handler.on_message(message);
        }
    }

    pub fn dispatch_connection(&self, connected: bool, chat_history: Option<&Value>) {
        for handler in snapshot(&self.connection_handlers) {
            handler.on_connection_change(connected, chat_history);
        }
    }

    pub fn dispatch_error(&self, error: &WsError) {
        for handler in snapshot(&self.error_handlers) {
            handler.on_error(error);
        }
    }

    /// 当前已注册的处理器数量：(消息, 连接状态, 错误)。
    #[cfg(test)]
    fn counts(&self) -> (usize, usize, usize) {
        (
            snapshot(&self.message_handlers).len(),
            snapshot(&self.connection_handlers).len(),
            snapshot(&self.error_handlers).len(),
        )
    }
}

// 处理器 panic 只会发生在锁外，锁中毒时数据本身仍然有效
fn append<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>, handler: Arc<T>) {
    list.write().unwrap_or_else(PoisonError::into_inner).push(handler);
}

fn snapshot<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}
