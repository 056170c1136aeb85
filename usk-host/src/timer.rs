//! # Timer 模块
//!
//! `every(<秒>)` 事件的计时器。
//!
//! 每个不同的间隔参数对应一个循环计时器，同参数的处理器共享它。
//! 计时器由宿主主循环按 `timer_resolution_ms` 轮询，
//! 触发时只执行间隔参数相同的 `every` 处理器。
//! 每次重新加载脚本后整体重建。

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use usk_runtime::{
    EVERY_EVENT, Engine, Environment, EventNode, ExecutionContext, RaiseOutcome,
    timer_interval_secs,
};

#[derive(Debug, Clone)]
struct Timer {
    /// 原样保存的间隔参数，同时作为计时器键
    scalar: String,
    interval: Duration,
    next_fire: Instant,
}

/// 计时器表
#[derive(Debug, Default)]
pub struct TimerSchedule {
    timers: Vec<Timer>,
}

impl TimerSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已加载事件构建计时器表
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a EventNode>, now: Instant) -> Self {
        let mut schedule = Self::new();
        for event in events.into_iter().filter(|e| e.is_timer()) {
            let Some(scalar) = event.event_data.as_deref() else {
                continue;
            };
            schedule.register(scalar, now);
        }
        schedule
    }

    /// 注册一个间隔参数；重复参数忽略，无效参数记录警告
    ///
    /// 返回是否新增了计时器。
    pub fn register(&mut self, scalar: &str, now: Instant) -> bool {
        if self.timers.iter().any(|t| t.scalar == scalar) {
            return false;
        }

        let interval = timer_interval_secs(scalar)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|d| !d.is_zero());
        let Some(interval) = interval else {
            warn!(target: "usk", scalar, "every 间隔无效，已忽略");
            return false;
        };

        let Some(next_fire) = now.checked_add(interval) else {
            warn!(target: "usk", scalar, "every 间隔过大，已忽略");
            return false;
        };

        debug!(target: "usk", scalar, secs = interval.as_secs_f64(), "注册计时器");
        self.timers.push(Timer {
            scalar: scalar.to_string(),
            interval,
            next_fire,
        });
        true
    }

    /// 推进到 `now`，返回到期的间隔参数
    pub fn tick(&mut self, now: Instant) -> Vec<String> {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            if now >= timer.next_fire {
                fired.push(timer.scalar.clone());
                // 溢出时停在当前时刻，下次轮询继续触发
                timer.next_fire = now.checked_add(timer.interval).unwrap_or(now);
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// 已注册的间隔参数，按注册顺序
    pub fn scalars(&self) -> impl Iterator<Item = &str> {
        self.timers.iter().map(|t| t.scalar.as_str())
    }
}

/// 触发一个计时器：无玩家上下文，事件数据为间隔参数
pub async fn fire<E: Environment>(engine: &Engine<E>, scalar: &str) -> RaiseOutcome {
    let mut ctx = ExecutionContext::detached().with_event_data(scalar);
    engine
        .raise_matching(
            EVERY_EVENT,
            |event| event.event_data.as_deref() == Some(scalar),
            &mut ctx,
        )
        .await
}
