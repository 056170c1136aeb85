//! # Catalog 模块
//!
//! 动作与条件目录。每一条动作/条件文本在解析时被匹配到固定的
//! "关键字 + 模式" 语法，编译为带类型的 [`Action`] / [`Condition`]。
//!
//! ## 设计原则
//!
//! - 匹配在解析期完成一次，运行时只做分派
//! - 匹配失败不报错：编译为 `Unknown`，运行到此处时记录诊断后继续
//! - 字面量超出字段范围时编译为 `Invalid`，运行到此处时中止事件体
//! - 关键字大小写敏感

mod action;
mod condition;

pub use action::{Action, compile_action};
pub use condition::{CompareOp, Condition, MESSAGE_SUBJECT, StatOperand, compile_condition};

use std::fmt;

use serde::{Deserialize, Serialize};

/// 唯一会被解析到当前玩家的目标名
pub const PLAYER_TARGET: &str = "player";

/// 动作/条件作用的目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// 当前上下文中的玩家
    Player,
    /// 其他名字，运行时不会被解析
    Named(String),
}

impl Target {
    pub fn from_word(word: &str) -> Self {
        if word == PLAYER_TARGET {
            Self::Player
        } else {
            Self::Named(word.to_string())
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str(PLAYER_TARGET),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// 取值范围为 0–255 的玩家属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalStat {
    Health,
    Food,
    Water,
    Stamina,
    Virus,
}

impl VitalStat {
    /// 对应的脚本关键字（不含 `set_` 前缀）
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Food => "food",
            Self::Water => "water",
            Self::Stamina => "stamina",
            Self::Virus => "virus",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "health" => Some(Self::Health),
            "food" => Some(Self::Food),
            "water" => Some(Self::Water),
            "stamina" => Some(Self::Stamina),
            "virus" => Some(Self::Virus),
            _ => None,
        }
    }
}

impl fmt::Display for VitalStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
