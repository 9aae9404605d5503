// chat_console/src/lib.rs

//! `chat_console` 终端聊天客户端核心库。
//!
//! - `config`: 配置文件加载、环境变量覆盖与全局访问。
//! - `console`: 终端输入解析，以及把适配器事件打印到终端的处理器。
//! - `error`: 应用错误类型。

pub mod config;
pub mod console;
pub mod error;
