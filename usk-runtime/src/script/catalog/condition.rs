//! # 条件目录
//!
//! ```text
//! startswith <subject> "<text>"
//! equals <subject> "<text>"
//! has_permission <target> "<permission>"
//! money | health | food | water | stamina | virus | experience | reputation <target> <op> <n>
//! is_in_vehicle <target>
//! ```
//!
//! `<op>` 只有 `>=`、`<=`、`>`、`<`、`==`，没有 `!=`。

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Target, VitalStat};
use crate::script::parser::helpers::{
    is_decimal_literal, is_digits, is_signed_integer, quoted_to_end, skip_required_whitespace,
    take_word, take_word_then_space,
};

/// 唯一可用的消息主体名
pub const MESSAGE_SUBJECT: &str = "msg";

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl CompareOp {
    /// 按匹配优先级排列（较长的运算符在前）
    const ALL: [(&'static str, CompareOp); 5] = [
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        ("==", CompareOp::Eq),
    ];

    /// 读取开头的运算符，返回 `(运算符, 剩余部分)`
    fn take(s: &str) -> Option<(Self, &str)> {
        Self::ALL
            .iter()
            .find_map(|(token, op)| s.strip_prefix(token).map(|rest| (*op, rest)))
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
        }
    }

    /// 对 `lhs <op> rhs` 求值
    pub fn apply<T: PartialOrd>(self, lhs: &T, rhs: &T) -> bool {
        let Some(ordering) = lhs.partial_cmp(rhs) else {
            return false;
        };
        match self {
            Self::Ge => ordering != Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Eq => ordering == Ordering::Equal,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 比较的右操作数，类型与属性的原生类型一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatOperand {
    Money(Decimal),
    Vital(VitalStat, u8),
    Experience(u32),
    Reputation(i32),
}

/// 编译后的条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// 消息前缀（大小写不敏感）
    StartsWith { subject: String, text: String },
    /// 消息相等（大小写不敏感）
    Equals { subject: String, text: String },
    HasPermission { target: Target, permission: String },
    /// 属性比较
    Compare {
        target: Target,
        op: CompareOp,
        operand: StatOperand,
    },
    IsInVehicle { target: Target },
    /// 模式匹配成功但字面量超出字段范围
    Invalid { message: String },
    /// 没有匹配任何模式，求值为 false
    Unknown,
}

impl Condition {
    /// 条件作用的目标（如果有）
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::HasPermission { target, .. }
            | Self::Compare { target, .. }
            | Self::IsInVehicle { target } => Some(target),
            Self::StartsWith { .. } | Self::Equals { .. } | Self::Invalid { .. } | Self::Unknown => {
                None
            }
        }
    }
}

/// 将条件原文编译为 [`Condition`]
pub fn compile_condition(raw: &str) -> Condition {
    let raw = raw.trim();
    take_word(raw)
        .and_then(|(keyword, rest)| {
            let args = skip_required_whitespace(rest)?;
            compile_with_args(keyword, args)
        })
        .unwrap_or(Condition::Unknown)
}

fn compile_with_args(keyword: &str, args: &str) -> Option<Condition> {
    let condition = match keyword {
        "startswith" | "equals" => {
            let (subject, rest) = take_word_then_space(args)?;
            let subject = subject.to_string();
            let text = quoted_to_end(rest)?.to_string();
            if keyword == "startswith" {
                Condition::StartsWith { subject, text }
            } else {
                Condition::Equals { subject, text }
            }
        }
        "has_permission" => {
            let (word, rest) = take_word_then_space(args)?;
            Condition::HasPermission {
                target: Target::from_word(word),
                permission: quoted_to_end(rest)?.to_string(),
            }
        }
        "is_in_vehicle" => match take_word(args)? {
            (word, "") => Condition::IsInVehicle {
                target: Target::from_word(word),
            },
            _ => return None,
        },
        stat => {
            let (word, rest) = take_word_then_space(args)?;
            let (op, rest) = CompareOp::take(rest)?;
            let value = skip_required_whitespace(rest)?;
            let target = Target::from_word(word);
            match compile_operand(stat, value)? {
                Ok(operand) => Condition::Compare {
                    target,
                    op,
                    operand,
                },
                Err(invalid) => invalid,
            }
        }
    };
    Some(condition)
}

/// 外层 `None` 表示模式不匹配，内层 `Err` 表示字面量越界
fn compile_operand(stat: &str, value: &str) -> Option<Result<StatOperand, Condition>> {
    let operand = match stat {
        "money" => {
            if !is_decimal_literal(value) {
                return None;
            }
            literal(value, "金额").map(StatOperand::Money)
        }
        "experience" => {
            if !is_digits(value) {
                return None;
            }
            literal(value, "经验值").map(StatOperand::Experience)
        }
        "reputation" => {
            if !is_signed_integer(value) {
                return None;
            }
            literal(value, "声望").map(StatOperand::Reputation)
        }
        other => {
            let vital = VitalStat::from_keyword(other)?;
            if !is_digits(value) {
                return None;
            }
            literal(value, vital.keyword()).map(|v| StatOperand::Vital(vital, v))
        }
    };
    Some(operand)
}

fn literal<T: FromStr>(text: &str, field: &str) -> Result<T, Condition> {
    text.parse().map_err(|_| Condition::Invalid {
        message: format!("{} 超出范围: {}", field, text),
    })
}
