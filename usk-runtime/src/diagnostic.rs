//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO 或宿主。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用 parser/AST 以及解析期编译出的动作目录，不重复解析逻辑

use serde::{Deserialize, Serialize};

use crate::script::{Action, Condition, EventNode, Node, ScriptFile, Target};

/// 诊断级别
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 脚本文件路径
    pub script_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如原始行内容）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    /// 创建警告诊断
    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    /// 创建信息诊断
    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticResult {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

/// 分析脚本，返回诊断结果
///
/// 只检查解析期已经能确定的问题：
/// - 未知的动作/条件（Warn）
/// - 字面量超出范围（Error，执行到此处会中止事件体）
/// - 目标不是 `player` 的动作/条件（Warn，运行时为空操作）
/// - `every` 事件的间隔不是正数（Warn，宿主不会为它注册计时器）
/// - 空事件体（Info）
pub fn analyze_script(script: &ScriptFile) -> DiagnosticResult {
    let script_id = script.file_path.display().to_string();
    let mut result = DiagnosticResult::new();

    for event in &script.events {
        analyze_event(&script_id, event, &mut result);
    }

    result
}

fn analyze_event(script_id: &str, event: &EventNode, result: &mut DiagnosticResult) {
    if event.is_timer() {
        match event.event_data.as_deref() {
            Some(data) if timer_interval_secs(data).is_some() => {}
            Some(data) => result.push(
                Diagnostic::warn(script_id, format!("every 事件的间隔无效: '{}'", data))
                    .with_line(event.line_number),
            ),
            None => result.push(
                Diagnostic::warn(script_id, "every 事件缺少间隔参数")
                    .with_line(event.line_number),
            ),
        }
    }

    if event.body.is_empty() {
        result.push(
            Diagnostic::info(script_id, format!("事件 '{}' 的事件体为空", event.event_name))
                .with_line(event.line_number),
        );
    }

    analyze_nodes(script_id, &event.body, result);
}

fn analyze_nodes(script_id: &str, nodes: &[Node], result: &mut DiagnosticResult) {
    for node in nodes {
        match node {
            Node::Action(action) => {
                let at = |d: Diagnostic| d.with_line(action.line_number).with_detail(&action.action_raw);
                match &action.action {
                    Action::Unknown => result.push(at(Diagnostic::warn(script_id, "未知动作"))),
                    Action::Invalid { message } => {
                        result.push(at(Diagnostic::error(
                            script_id,
                            format!("无效的字面量: {}", message),
                        )));
                    }
                    other => {
                        if let Some(Target::Named(name)) = other.target() {
                            result.push(at(Diagnostic::warn(
                                script_id,
                                format!("目标 '{}' 不是 player，动作不会生效", name),
                            )));
                        }
                    }
                }
            }
            Node::If(branch) => {
                let at = |d: Diagnostic| d.with_line(branch.line_number).with_detail(&branch.condition_raw);
                match &branch.condition {
                    Condition::Unknown => result.push(at(Diagnostic::warn(script_id, "未知条件"))),
                    Condition::Invalid { message } => {
                        result.push(at(Diagnostic::error(
                            script_id,
                            format!("无效的字面量: {}", message),
                        )));
                    }
                    other => {
                        if let Some(Target::Named(name)) = other.target() {
                            result.push(at(Diagnostic::warn(
                                script_id,
                                format!("目标 '{}' 不是 player，条件恒为假", name),
                            )));
                        }
                    }
                }
                analyze_nodes(script_id, &branch.then_body, result);
                analyze_nodes(script_id, &branch.else_body, result);
            }
            Node::Event(_) => {}
        }
    }
}

/// 解析 `every` 事件的间隔（秒）
///
/// 只接受有限的正数。
pub fn timer_interval_secs(data: &str) -> Option<f64> {
    data.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}
