//! # usk
//!
//! USK 脚本引擎的参考宿主。
//!
//! ## 用法
//!
//! ```text
//! usk [--config usk.json] [--scripts DIR] <COMMAND>
//!
//!   info [--json]                 打印已加载脚本与事件统计
//!   reload                        加载脚本目录并打印摘要
//!   raise <EVENT> [...]           以控制台玩家身份触发一次事件
//!   run [--ticks N]               交互会话（默认）
//! ```
//!
//! 日志级别取自配置文件的 `log_level`，`RUST_LOG` 优先。

mod bootstrap;
mod commands;
mod config;
mod console;
mod timer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::commands::Host;
use crate::config::{ConfigError, DEFAULT_CONFIG_FILE, HostConfig};
use crate::console::ConsoleOutput;

#[derive(Parser, Debug)]
#[command(name = "usk", version, about = "USK 事件脚本引擎")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 覆盖配置中的脚本目录
    #[arg(long)]
    scripts: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 打印已加载脚本与事件统计
    Info {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 加载脚本目录并打印摘要
    Reload,
    /// 以控制台玩家身份触发一次事件
    Raise {
        /// 事件名，如 player_join
        event: String,
        /// 控制台玩家名
        #[arg(long)]
        player: Option<String>,
        /// 聊天消息（{msg}）
        #[arg(long)]
        message: Option<String>,
        /// 事件数据，如 damage:12
        #[arg(long)]
        data: Option<String>,
        /// 先以 JSON 打印匹配的处理器
        #[arg(long)]
        dump: bool,
    },
    /// 交互会话：stdin 每行作为聊天消息
    Run {
        /// 计时器轮询 N 次后退出
        #[arg(long)]
        ticks: Option<u64>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = real_main().await {
        eprintln!("usk error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = HostConfig::load(&cli.config);
    init_logging(&config.log_level);
    match load_error {
        Some(ConfigError::NotFound(path)) => {
            warn!("配置文件不存在: {}，使用默认配置", path.display());
        }
        Some(err) => warn!(error = %err, "配置文件无效，使用默认配置"),
        None => {}
    }

    if let Some(scripts) = cli.scripts {
        config.scripts_dir = scripts;
    }
    if let Some(Command::Raise {
        player: Some(name), ..
    }) = &cli.command
    {
        config.player.name = name.clone();
        config.player.display_name.clear();
    }
    config.validate()?;

    let host = Host::new(config, ConsoleOutput::Stdout);
    let stats = host.start()?;

    match cli.command.unwrap_or(Command::Run { ticks: None }) {
        Command::Info { json } => host.print_info(json)?,
        Command::Reload => println!(
            "已加载 {} 个脚本，共 {} 个事件: {}",
            stats.total_scripts,
            stats.total_events,
            stats.event_type_names.join(", ")
        ),
        Command::Raise {
            event,
            message,
            data,
            dump,
            ..
        } => {
            host.raise_command(&event, message.as_deref(), data.as_deref(), dump)
                .await?;
        }
        Command::Run { ticks } => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            host.run(ticks, stdin).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_raise() {
        let cli = Cli::try_parse_from([
            "usk",
            "--scripts",
            "demo",
            "raise",
            "player_chat",
            "--player",
            "Bob",
            "--message",
            "/stats",
            "--dump",
        ])
        .unwrap();

        assert_eq!(cli.scripts, Some(PathBuf::from("demo")));
        match cli.command {
            Some(Command::Raise {
                event,
                player,
                message,
                dump,
                data,
            }) => {
                assert_eq!(event, "player_chat");
                assert_eq!(player.as_deref(), Some("Bob"));
                assert_eq!(message.as_deref(), Some("/stats"));
                assert!(dump);
                assert!(data.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["usk"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}
