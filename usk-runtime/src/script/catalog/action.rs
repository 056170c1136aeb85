//! # 动作目录
//!
//! 每个动作形如 `<关键字> <参数...>`，关键字之后的部分按固定模式匹配：
//!
//! ```text
//! cancel
//! message <target> "<text>"
//! broadcast "<text>"
//! give <target> "<item>" <n>
//! teleport <target> "<location>"
//! add_money | set_money <target> <amount>
//! set_health | set_food | set_water | set_stamina | set_virus <target> <n>
//! kill | heal | feed | clear_inventory | exit_vehicle <target>
//! kick <target> "<reason>"
//! add_experience | set_experience <target> <n>
//! set_reputation <target> <n>
//! run_command "<command>"
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Target, VitalStat};
use crate::script::parser::helpers::{
    is_decimal_literal, is_digits, is_signed_integer, quoted_to_end, skip_required_whitespace,
    split_trailing_number, take_word, take_word_then_space,
};

/// 编译后的动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// 将上下文标记为已取消
    Cancel,
    /// 向玩家发送消息（插值）
    Message { target: Target, text: String },
    /// 向所有玩家广播（插值）
    Broadcast { text: String },
    /// 给予物品
    Give {
        target: Target,
        item: String,
        amount: i32,
    },
    /// 传送
    Teleport { target: Target, location: String },
    AddMoney { target: Target, amount: Decimal },
    SetMoney { target: Target, amount: Decimal },
    /// 设置 0–255 范围的属性
    SetStat {
        target: Target,
        stat: VitalStat,
        value: u8,
    },
    Kill { target: Target },
    /// 踢出（理由插值）
    Kick { target: Target, reason: String },
    AddExperience { target: Target, amount: u32 },
    SetExperience { target: Target, amount: u32 },
    SetReputation { target: Target, value: i32 },
    /// 生命值回满
    Heal { target: Target },
    /// 饱食度与水分回满
    Feed { target: Target },
    ClearInventory { target: Target },
    ExitVehicle { target: Target },
    /// 执行服务器命令（插值，等待完成）
    RunCommand { command: String },
    /// 模式匹配成功但字面量超出字段范围
    Invalid { message: String },
    /// 没有匹配任何模式
    Unknown,
}

impl Action {
    /// 动作作用的目标（如果有）
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::Message { target, .. }
            | Self::Give { target, .. }
            | Self::Teleport { target, .. }
            | Self::AddMoney { target, .. }
            | Self::SetMoney { target, .. }
            | Self::SetStat { target, .. }
            | Self::Kill { target }
            | Self::Kick { target, .. }
            | Self::AddExperience { target, .. }
            | Self::SetExperience { target, .. }
            | Self::SetReputation { target, .. }
            | Self::Heal { target }
            | Self::Feed { target }
            | Self::ClearInventory { target }
            | Self::ExitVehicle { target } => Some(target),
            Self::Cancel
            | Self::Broadcast { .. }
            | Self::RunCommand { .. }
            | Self::Invalid { .. }
            | Self::Unknown => None,
        }
    }

    /// 是否已被识别（非 `Unknown`）
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// 将动作原文编译为 [`Action`]
pub fn compile_action(raw: &str) -> Action {
    let raw = raw.trim();
    let Some((keyword, rest)) = take_word(raw) else {
        return Action::Unknown;
    };

    if rest.is_empty() {
        return if keyword == "cancel" {
            Action::Cancel
        } else {
            Action::Unknown
        };
    }

    skip_required_whitespace(rest)
        .and_then(|args| compile_with_args(keyword, args))
        .unwrap_or(Action::Unknown)
}

fn compile_with_args(keyword: &str, args: &str) -> Option<Action> {
    let action = match keyword {
        "message" => {
            let (target, text) = target_and_quoted(args)?;
            Action::Message { target, text }
        }
        "broadcast" => Action::Broadcast {
            text: quoted_to_end(args)?.to_string(),
        },
        "give" => {
            let (word, rest) = take_word_then_space(args)?;
            let (item, amount) = split_trailing_number(rest)?;
            let item = quoted_to_end(item)?.to_string();
            match literal::<i32>(amount, "物品数量") {
                Ok(amount) => Action::Give {
                    target: Target::from_word(word),
                    item,
                    amount,
                },
                Err(invalid) => invalid,
            }
        }
        "teleport" => {
            let (target, location) = target_and_quoted(args)?;
            Action::Teleport { target, location }
        }
        "kick" => {
            let (target, reason) = target_and_quoted(args)?;
            Action::Kick { target, reason }
        }
        "add_money" | "set_money" => {
            let (target, value) = target_and_value(args)?;
            if !is_decimal_literal(value) {
                return None;
            }
            match literal::<Decimal>(value, "金额") {
                Ok(amount) if keyword == "add_money" => Action::AddMoney { target, amount },
                Ok(amount) => Action::SetMoney { target, amount },
                Err(invalid) => invalid,
            }
        }
        "add_experience" | "set_experience" => {
            let (target, value) = target_and_value(args)?;
            if !is_digits(value) {
                return None;
            }
            match literal::<u32>(value, "经验值") {
                Ok(amount) if keyword == "add_experience" => {
                    Action::AddExperience { target, amount }
                }
                Ok(amount) => Action::SetExperience { target, amount },
                Err(invalid) => invalid,
            }
        }
        "set_reputation" => {
            let (target, value) = target_and_value(args)?;
            if !is_signed_integer(value) {
                return None;
            }
            match literal::<i32>(value, "声望") {
                Ok(value) => Action::SetReputation { target, value },
                Err(invalid) => invalid,
            }
        }
        "kill" => Action::Kill {
            target: target_only(args)?,
        },
        "heal" => Action::Heal {
            target: target_only(args)?,
        },
        "feed" => Action::Feed {
            target: target_only(args)?,
        },
        "clear_inventory" => Action::ClearInventory {
            target: target_only(args)?,
        },
        "exit_vehicle" => Action::ExitVehicle {
            target: target_only(args)?,
        },
        "run_command" => Action::RunCommand {
            command: quoted_to_end(args)?.to_string(),
        },
        other => {
            let stat = other.strip_prefix("set_").and_then(VitalStat::from_keyword)?;
            let (target, value) = target_and_value(args)?;
            if !is_digits(value) {
                return None;
            }
            match literal::<u8>(value, stat.keyword()) {
                Ok(value) => Action::SetStat {
                    target,
                    stat,
                    value,
                },
                Err(invalid) => invalid,
            }
        }
    };
    Some(action)
}

/// `<target> "<text>"`
fn target_and_quoted(args: &str) -> Option<(Target, String)> {
    let (word, rest) = take_word_then_space(args)?;
    Some((Target::from_word(word), quoted_to_end(rest)?.to_string()))
}

/// `<target> <value>`，value 不含空白
fn target_and_value(args: &str) -> Option<(Target, &str)> {
    let (word, value) = take_word_then_space(args)?;
    Some((Target::from_word(word), value))
}

/// `<target>` 且之后没有其他内容
fn target_only(args: &str) -> Option<Target> {
    match take_word(args)? {
        (word, "") => Some(Target::from_word(word)),
        _ => None,
    }
}

fn literal<T: FromStr>(text: &str, field: &str) -> Result<T, Action> {
    text.parse().map_err(|_| Action::Invalid {
        message: format!("{} 超出范围: {}", field, text),
    })
}
