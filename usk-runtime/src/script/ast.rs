//! # AST 模块
//!
//! 定义 `.usk` 脚本的抽象语法树。
//!
//! ## 设计说明
//!
//! - 结构（事件、条件块、动作）由解析器根据缩进确定
//! - 每个动作/条件在解析时被编译为 [`Action`] / [`Condition`]，
//!   同时保留原始文本用于诊断
//! - 解析完成后 AST 只读；重新加载时整体替换

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::catalog::{Action, Condition, compile_action, compile_condition};

/// 计时器事件的保留名称，其参数是一个标量而不是参数列表
pub const EVERY_EVENT: &str = "every";

/// 所有 AST 节点共有的位置信息
pub trait AstNode {
    /// 源文件行号（从 1 开始）
    fn line_number(&self) -> usize;
    /// 解析时的块深度
    fn indent_level(&self) -> usize;
}

/// 脚本节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// 事件定义（只出现在顶层）
    Event(EventNode),
    /// 条件块
    If(IfNode),
    /// 单条动作
    Action(ActionNode),
}

impl AstNode for Node {
    fn line_number(&self) -> usize {
        match self {
            Self::Event(n) => n.line_number,
            Self::If(n) => n.line_number,
            Self::Action(n) => n.line_number,
        }
    }

    fn indent_level(&self) -> usize {
        match self {
            Self::Event(n) => n.indent_level,
            Self::If(n) => n.indent_level,
            Self::Action(n) => n.indent_level,
        }
    }
}

impl Node {
    /// 如果是动作节点，返回它
    pub fn as_action(&self) -> Option<&ActionNode> {
        match self {
            Self::Action(n) => Some(n),
            _ => None,
        }
    }

    /// 如果是条件节点，返回它
    pub fn as_if(&self) -> Option<&IfNode> {
        match self {
            Self::If(n) => Some(n),
            _ => None,
        }
    }
}

/// 事件定义
///
/// 对应 `event <name>(<params>):` 语法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNode {
    pub line_number: usize,
    pub indent_level: usize,
    /// 事件名（查找时大小写不敏感）
    pub event_name: String,
    /// 声明的参数名，仅作说明，运行时不绑定
    pub parameters: Vec<String>,
    /// `every(30)` 这类事件的标量参数
    pub event_data: Option<String>,
    /// 事件体
    pub body: Vec<Node>,
    /// 所在脚本（解析时的路径），用于诊断
    #[serde(default)]
    pub script_id: String,
}

impl EventNode {
    pub fn new(line_number: usize, event_name: impl Into<String>) -> Self {
        Self {
            line_number,
            indent_level: 0,
            event_name: event_name.into(),
            parameters: Vec::new(),
            event_data: None,
            body: Vec::new(),
            script_id: String::new(),
        }
    }

    /// 是否是计时器事件
    pub fn is_timer(&self) -> bool {
        self.event_name == EVERY_EVENT
    }
}

impl AstNode for EventNode {
    fn line_number(&self) -> usize {
        self.line_number
    }

    fn indent_level(&self) -> usize {
        self.indent_level
    }
}

impl fmt::Display for EventNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {}({})", self.event_name, self.parameters.join(", "))?;
        if let Some(data) = &self.event_data {
            write!(f, " [{}]", data)?;
        }
        Ok(())
    }
}

/// 条件块
///
/// 对应 `if <condition>:` 以及可选的同级 `else:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfNode {
    pub line_number: usize,
    pub indent_level: usize,
    /// 条件原文
    pub condition_raw: String,
    /// 编译后的条件
    pub condition: Condition,
    pub then_body: Vec<Node>,
    /// 没有 `else:` 时为空
    pub else_body: Vec<Node>,
}

impl IfNode {
    pub fn new(line_number: usize, indent_level: usize, condition_raw: impl Into<String>) -> Self {
        let condition_raw = condition_raw.into();
        let condition = compile_condition(&condition_raw);
        Self {
            line_number,
            indent_level,
            condition_raw,
            condition,
            then_body: Vec::new(),
            else_body: Vec::new(),
        }
    }
}

impl AstNode for IfNode {
    fn line_number(&self) -> usize {
        self.line_number
    }

    fn indent_level(&self) -> usize {
        self.indent_level
    }
}

/// 单条动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    pub line_number: usize,
    pub indent_level: usize,
    /// 动作原文
    pub action_raw: String,
    /// 编译后的动作
    pub action: Action,
}

impl ActionNode {
    pub fn new(line_number: usize, indent_level: usize, action_raw: impl Into<String>) -> Self {
        let action_raw = action_raw.into();
        let action = compile_action(&action_raw);
        Self {
            line_number,
            indent_level,
            action_raw,
            action,
        }
    }
}

impl AstNode for ActionNode {
    fn line_number(&self) -> usize {
        self.line_number
    }

    fn indent_level(&self) -> usize {
        self.indent_level
    }
}

/// 解析后的脚本文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFile {
    /// 文件名（如 `join.usk`）
    pub file_name: String,
    /// 完整路径
    pub file_path: PathBuf,
    /// 文件中的所有事件，按出现顺序
    pub events: Vec<EventNode>,
}

impl ScriptFile {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            file_path,
            events: Vec::new(),
        }
    }

    /// 事件数量
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// 是否没有任何事件
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 以缩进树的形式渲染结构，用于调试输出与快照测试
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&format!("{}: {}\n", event.line_number, event));
            write_outline(&mut out, &event.body, 1);
        }
        out
    }
}

fn write_outline(out: &mut String, nodes: &[Node], depth: usize) {
    let pad = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Action(action) => {
                out.push_str(&format!("{pad}{}: {}\n", action.line_number, action.action_raw));
            }
            Node::If(branch) => {
                out.push_str(&format!(
                    "{pad}{}: if {}\n",
                    branch.line_number, branch.condition_raw
                ));
                write_outline(out, &branch.then_body, depth + 1);
                if !branch.else_body.is_empty() {
                    out.push_str(&format!("{pad}else\n"));
                    write_outline(out, &branch.else_body, depth + 1);
                }
            }
            Node::Event(event) => {
                out.push_str(&format!("{pad}{}: {}\n", event.line_number, event));
            }
        }
    }
}

impl fmt::Display for ScriptFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} events)", self.file_name, self.events.len())
    }
}
