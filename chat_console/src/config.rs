// chat_console/src/config.rs

//! 终端聊天客户端的配置管理。
//!
//! 配置从工作目录下的 `chat_console_config.json` 读取；文件缺失或损坏时使用默认配置并写回。
//! 随后依次应用环境变量覆盖 (`CHAT_WS_URL`, `CHAT_SESSION_ID`)。
//! 会话标识为空时在启动阶段生成一个 UUID v4。

use crate::error::AppError;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "chat_console_config.json";
/// 默认的聊天服务地址
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8088/chat";

/// 覆盖服务地址的环境变量
pub const ENV_SERVER_URL: &str = "CHAT_WS_URL";
/// 覆盖会话标识的环境变量
pub const ENV_SESSION_ID: &str = "CHAT_SESSION_ID";

/// 终端聊天客户端配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatConsoleConfig {
    /// 聊天服务的 WebSocket 地址
    pub server_url: String,
    /// 会话标识，原样随每条消息发送；为空时启动时自动生成
    #[serde(default)]
    pub session_id: String,
}

impl Default for ChatConsoleConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session_id: String::new(),
        }
    }
}

impl ChatConsoleConfig {
    /// 用查找函数提供的值覆盖对应字段，空字符串视为未设置。
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.is_empty()) {
            info!("[配置模块] 使用环境变量 {} 覆盖服务地址: {}", ENV_SERVER_URL, url);
            self.server_url = url;
        }
        if let Some(session_id) = lookup(ENV_SESSION_ID).filter(|v| !v.is_empty()) {
            info!("[配置模块] 使用环境变量 {} 覆盖会话标识。", ENV_SESSION_ID);
            self.session_id = session_id;
        }
        self
    }

    /// 会话标识为空时生成一个新的 UUID v4。
    pub fn ensure_session_id(mut self) -> Self {
        if self.session_id.is_empty() {
            self.session_id = Uuid::new_v4().to_string();
            info!("[配置模块] 未配置会话标识，已生成: {}", self.session_id);
        }
        self
    }
}

static APP_CONFIG: OnceLock<ChatConsoleConfig> = OnceLock::new();

fn read_config_file(path: &Path) -> Result<ChatConsoleConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件 '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("配置文件 '{}' 不是有效的配置 JSON", path.display()))
}

fn save_config(config: &ChatConsoleConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录 '{}' 失败", parent.display()))?;
        }
    }
    let content = serde_json::to_string_pretty(config).context("序列化配置失败")?;
    fs::write(path, content).with_context(|| format!("写入配置文件 '{}' 失败", path.display()))
}

/// 从指定路径加载配置；失败时返回默认配置并尝试写回该路径。
pub fn load_or_create_config(path: &Path) -> ChatConsoleConfig {
    match read_config_file(path) {
        Ok(config) => {
            info!("[配置模块] 已从 {:?} 加载配置。", path);
            config
        }
        Err(e) => {
            warn!("[配置模块] {:#}。将使用默认配置并尝试写回。", e);
            let default_config = ChatConsoleConfig::default();
            match save_config(&default_config, path) {
                Ok(()) => info!("[配置模块] 默认配置已保存到 {:?}。", path),
                Err(e) => warn!("[配置模块] 保存默认配置失败: {:#}", e),
            }
            default_config
        }
    }
}

fn config_file_path() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// 初始化全局配置：文件 → 环境变量覆盖 → 补全会话标识。
pub fn init_config() {
    let loaded_config = load_or_create_config(&config_file_path())
        .apply_overrides(|key| env::var(key).ok())
        .ensure_session_id();
    if APP_CONFIG.set(loaded_config).is_err() {
        warn!("[配置模块] 全局配置已初始化过，本次调用未覆盖已有配置。");
    }
}

/// 获取已初始化的全局配置。
pub fn get_config() -> Result<&'static ChatConsoleConfig, AppError> {
    APP_CONFIG
        .get()
        .ok_or_else(|| AppError::ConfigError("全局配置尚未初始化，请先调用 init_config()".to_string()))
}
