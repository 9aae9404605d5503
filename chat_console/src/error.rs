// chat_console/src/error.rs

use thiserror::Error;

/// 终端聊天客户端的主要错误类型。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("终端 I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效的输入: {0}")]
    InvalidCommand(String),

    #[error("连接失败: {0}")]
    ConnectFailed(String),
}
