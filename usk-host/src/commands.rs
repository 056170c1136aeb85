//! # Commands 模块
//!
//! 命令行子命令的实现，围绕一个 [`Host`] 会话对象：
//! 控制台玩家、控制台环境与引擎。
//!
//! ## 交互模式
//!
//! `run` 把 stdin 的每一行当作控制台玩家的聊天消息，
//! 另外识别 `/usk reload`、`/usk info`、`/usk vehicle`（切换载具状态）与 `/quit`。

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use usk_runtime::{
    Engine, EngineOptions, ExecutionContext, LoadError, Player, RaiseOutcome, RegistryStats,
};

use crate::bootstrap;
use crate::config::HostConfig;
use crate::console::{ConsoleEnvironment, ConsoleOutput, ConsolePlayer};
use crate::timer::{self, TimerSchedule};

/// 内置事件名
pub mod events {
    pub const PLAYER_JOIN: &str = "player_join";
    pub const PLAYER_SPAWNED: &str = "player_spawned";
    pub const PLAYER_CHAT: &str = "player_chat";
    pub const PLAYER_DISCONNECT: &str = "player_disconnect";
}

/// 单次事件触发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaiseReport {
    pub outcome: RaiseOutcome,
    pub cancelled: bool,
}

/// 交互输入处理后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Reloaded,
    Quit,
}

/// 宿主会话
pub struct Host {
    config: HostConfig,
    engine: Engine<ConsoleEnvironment>,
    player: ConsolePlayer,
    output: ConsoleOutput,
}

impl Host {
    pub fn new(config: HostConfig, output: ConsoleOutput) -> Self {
        let options = EngineOptions {
            strict: config.strict_parsing,
            extension: config.extension().to_string(),
        };
        let environment = Arc::new(ConsoleEnvironment::new(output.clone()));
        let player = ConsolePlayer::from_seed(&config.player, output.clone());

        Self {
            engine: Engine::with_options(environment, options),
            player,
            output,
            config,
        }
    }

    pub fn engine(&self) -> &Engine<ConsoleEnvironment> {
        &self.engine
    }

    pub fn player(&self) -> &ConsolePlayer {
        &self.player
    }

    /// 准备脚本目录并首次加载，失败即启动失败
    pub fn start(&self) -> anyhow::Result<RegistryStats> {
        let dir = &self.config.scripts_dir;
        bootstrap::prepare_scripts_dir(dir, self.config.create_showcase)
            .with_context(|| format!("无法准备脚本目录: {}", dir.display()))?;

        let stats = self
            .reload()
            .with_context(|| format!("加载脚本目录失败: {}", dir.display()))?;
        Ok(stats)
    }

    pub fn reload(&self) -> Result<RegistryStats, LoadError> {
        self.engine.reload(&self.config.scripts_dir)
    }

    /// `info` 的文本形式
    pub fn info_lines(&self) -> Vec<String> {
        let stats = self.engine.get_stats();
        if stats.total_scripts == 0 {
            return vec!["&c未加载任何脚本".to_string()];
        }

        let mut lines = vec![
            "&e=== USK 信息 ===".to_string(),
            format!("&f已加载脚本: &a{}", stats.total_scripts),
            format!("&f事件总数: &a{}", stats.total_events),
            String::new(),
            "&f事件类型:".to_string(),
        ];
        lines.extend(
            stats
                .handler_counts
                .iter()
                .map(|(name, count)| format!("  &7- &e{} &7({} 个处理器)", name, count)),
        );
        lines
    }

    pub fn print_info(&self, json: bool) -> anyhow::Result<()> {
        if json {
            let stats = self.engine.get_stats();
            self.output.raw(serde_json::to_string_pretty(&stats)?);
        } else {
            for line in self.info_lines() {
                self.output.line(&line);
            }
        }
        Ok(())
    }

    /// 以控制台玩家身份触发事件
    pub async fn raise(
        &self,
        event: &str,
        message: Option<&str>,
        data: Option<&str>,
    ) -> RaiseReport {
        let mut ctx = ExecutionContext::for_player(&self.player);
        if let Some(message) = message {
            ctx = ctx.with_message(message);
        }
        if let Some(data) = data {
            ctx = ctx.with_event_data(data);
        }

        let outcome = self.engine.raise_event(event, &mut ctx).await;
        RaiseReport {
            outcome,
            cancelled: ctx.cancelled,
        }
    }

    /// `raise` 子命令
    pub async fn raise_command(
        &self,
        event: &str,
        message: Option<&str>,
        data: Option<&str>,
        dump: bool,
    ) -> anyhow::Result<RaiseReport> {
        if dump {
            let handlers = self.engine.get_events(event);
            let nodes: Vec<_> = handlers.iter().collect();
            self.output.raw(serde_json::to_string_pretty(&nodes)?);
        }

        let report = self.raise(event, message, data).await;
        self.output.line(&format!(
            "事件 '{}': 执行 {} 个处理器，中止 {} 个，已取消: {}",
            event,
            report.outcome.handled,
            report.outcome.aborted,
            if report.cancelled { "是" } else { "否" }
        ));
        Ok(report)
    }

    /// 重新加载并重建计时器；失败只记录，不结束会话
    fn reload_session(&self) -> TimerSchedule {
        match self.reload() {
            Ok(stats) => self.output.line(&format!(
                "&a已重新加载 {} 个脚本，共 {} 个事件",
                stats.total_scripts, stats.total_events
            )),
            Err(err) => self.output.line(&format!("&c重新加载失败: {}", err)),
        }
        self.timers()
    }

    fn timers(&self) -> TimerSchedule {
        let snapshot = self.engine.snapshot();
        let schedule = TimerSchedule::from_events(snapshot.all_events(), Instant::now());
        info!(
            target: "usk",
            timers = schedule.len(),
            intervals = ?schedule.scalars().collect::<Vec<_>>(),
            "计时器已就绪"
        );
        schedule
    }

    /// 处理一行交互输入
    pub async fn handle_line(&self, line: &str) -> anyhow::Result<Flow> {
        let line = line.trim();
        match line {
            "" => Ok(Flow::Continue),
            "/quit" => Ok(Flow::Quit),
            "/usk reload" => Ok(Flow::Reloaded),
            "/usk info" => {
                self.print_info(false)?;
                Ok(Flow::Continue)
            }
            "/usk vehicle" => {
                let in_vehicle = !self.player.is_in_vehicle();
                self.player.set_in_vehicle(in_vehicle);
                self.output.line(if in_vehicle { "&7已进入载具" } else { "&7已离开载具" });
                Ok(Flow::Continue)
            }
            message => {
                let report = self.raise(events::PLAYER_CHAT, Some(message), None).await;
                if !report.cancelled {
                    self.output
                        .line(&format!("<{}> {}", self.player.display_name(), message));
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// 交互会话
    ///
    /// `ticks` 为 `Some(n)` 时在 n 次计时器轮询后结束，不再依赖输入结束。
    pub async fn run<R>(&self, ticks: Option<u64>, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut schedule = self.timers();
        self.raise(events::PLAYER_JOIN, None, None).await;
        self.raise(events::PLAYER_SPAWNED, None, None).await;

        let period = Duration::from_millis(self.config.timer_resolution_ms.max(1));
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut lines = input.lines();
        let mut input_open = true;
        let mut elapsed: u64 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for scalar in schedule.tick(Instant::now()) {
                        timer::fire(&self.engine, &scalar).await;
                    }
                    elapsed += 1;
                    if ticks.is_some_and(|limit| elapsed >= limit) {
                        break;
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line.context("读取输入失败")? {
                        Some(line) => match self.handle_line(&line).await? {
                            Flow::Continue => {}
                            Flow::Reloaded => schedule = self.reload_session(),
                            Flow::Quit => break,
                        },
                        None => {
                            input_open = false;
                            if ticks.is_none() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        let report = self.raise(events::PLAYER_DISCONNECT, None, None).await;
        if report.outcome.aborted > 0 {
            warn!(target: "usk", aborted = report.outcome.aborted, "断开事件有处理器中止");
        }
        Ok(())
    }
}
