//! # 执行上下文
//!
//! 每次事件调用创建一个，调用结束后由宿主读取 `cancelled`。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::capability::Player;

/// 伤害事件的 `event_data` 前缀
pub const DAMAGE_PREFIX: &str = "damage:";

/// 变量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 布尔值
    Bool(bool),
}

/// 一次事件调用的执行上下文
///
/// `P` 默认为 `dyn Player`；没有玩家的事件（计时器、服务器启动）
/// 使用 [`ExecutionContext::detached`] 创建。
pub struct ExecutionContext<'a, P: Player + ?Sized = dyn Player> {
    /// 触发事件的玩家
    pub player: Option<&'a P>,
    /// 聊天消息
    pub message: Option<String>,
    /// 是否被脚本取消
    pub cancelled: bool,
    /// 变量表（当前没有动作读写它）
    pub variables: HashMap<String, VarValue>,
    /// 事件附带数据，如 `damage:12.5` 或计时器间隔
    pub event_data: Option<String>,
}

impl<'a, P: Player + ?Sized> ExecutionContext<'a, P> {
    /// 为指定玩家创建上下文
    pub fn for_player(player: &'a P) -> Self {
        Self {
            player: Some(player),
            message: None,
            cancelled: false,
            variables: HashMap::new(),
            event_data: None,
        }
    }

    /// 附带聊天消息
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 附带事件数据
    pub fn with_event_data(mut self, data: impl Into<String>) -> Self {
        self.event_data = Some(data.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// 从 `damage:<n>` 形式的事件数据中取出伤害值，否则为 0
    pub fn damage_amount(&self) -> f32 {
        self.event_data
            .as_deref()
            .and_then(|data| data.strip_prefix(DAMAGE_PREFIX))
            .and_then(|amount| amount.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

impl ExecutionContext<'_, dyn Player> {
    /// 创建没有玩家的上下文
    pub fn detached() -> Self {
        Self {
            player: None,
            message: None,
            cancelled: false,
            variables: HashMap::new(),
            event_data: None,
        }
    }
}

impl Default for ExecutionContext<'_, dyn Player> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<P: Player + ?Sized> std::fmt::Debug for ExecutionContext<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("player", &self.player.map(|p| p.name()))
            .field("message", &self.message)
            .field("cancelled", &self.cancelled)
            .field("variables", &self.variables)
            .field("event_data", &self.event_data)
            .finish()
    }
}
