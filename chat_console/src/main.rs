// chat_console/src/main.rs

use chat_console::config;
use chat_console::console::{parse_line, ConsoleCommand, ConsolePrinter, HELP_TEXT};
use chat_console::error::AppError;
use chat_ws_utils::client::{ConnectionAdapter, ReadyState};
use log::{error, info, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    // 默认 Info 级别，可通过 RUST_LOG 调整
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
    info!("[主程序] 日志系统已初始化 (env_logger)。");

    if let Err(e) = run().await {
        error!("[主程序] 致命错误: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    config::init_config();
    let app_config = config::get_config()?;
    info!(
        "[主程序] 配置已加载。服务地址: {}，会话标识: {}",
        app_config.server_url, app_config.session_id
    );

    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    let printer = ConsolePrinter::new(closed_tx);

    let mut adapter = ConnectionAdapter::new(app_config.server_url.clone(), app_config.session_id.clone());
    adapter.add_message_handler(printer.clone());
    adapter.add_connection_handler(printer.clone());
    adapter.add_error_handler(printer);
    adapter.connect();
    if adapter.ready_state().is_none() {
        return Err(AppError::ConnectFailed(format!("无法连接到 {}", app_config.server_url)));
    }
    println!("{}", HELP_TEXT);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = closed_rx.recv() => {
                info!("[主程序] 连接已关闭，退出。");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let command = match line? {
                    Some(line) => parse_line(&line),
                    None => {
                        stdin_open = false;
                        Ok(ConsoleCommand::Quit)
                    }
                };
                match command {
                    Ok(ConsoleCommand::Send { to, message }) => {
                        if !adapter.send_message(&to, &message) {
                            println!("消息未发送: 连接未打开");
                        }
                    }
                    Ok(ConsoleCommand::Quit) => {
                        if matches!(adapter.ready_state(), None | Some(ReadyState::Closed)) {
                            break;
                        }
                        adapter.disconnect();
                    }
                    Ok(ConsoleCommand::Help) => println!("{}", HELP_TEXT),
                    Ok(ConsoleCommand::Empty) => {}
                    Err(e) => println!("{}", e),
                }
            }
        }
    }
    Ok(())
}
