//! # Parser 模块
//!
//! 两阶段脚本解析器实现（手写解析，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 行预处理] → Vec<Line> → [阶段2: 结构解析] → Vec<EventNode>
//! ```
//!
//! ## 设计原则
//!
//! - 容错解析：尽可能解析有效内容，无效行跳过并记录警告
//! - 警告通过 [`Parser::warnings`] 旁路提供，不影响返回的 AST
//! - 严格模式下，存在警告的文件解析失败
//!
//! ## 模块结构
//!
//! - `helpers`: 辅助解析函数
//! - `preprocess`: 行预处理
//! - `structure`: 缩进结构解析

pub(crate) mod helpers;
mod preprocess;
mod structure;


use std::path::Path;

use tracing::{debug, warn};

use crate::diagnostic::Diagnostic;
use crate::error::ParseError;
use crate::script::ast::ScriptFile;

pub use preprocess::{COMMENT_MARKER, INDENT_WIDTH, Line, preprocess, preprocess_lines};
pub use structure::{parse_event_header, parse_if_header};

use structure::StructureParser;

/// 脚本解析器
#[derive(Debug, Default)]
pub struct Parser {
    /// 严格模式：被跳过的行视为错误
    strict: bool,
    /// 最近一次解析的警告
    warnings: Vec<Diagnostic>,
}

impl Parser {
    /// 创建新的解析器（非严格模式）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置严格模式
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// 最近一次解析产生的警告
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// 取走最近一次解析产生的警告
    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    /// 读取并解析脚本文件
    ///
    /// # 错误
    ///
    /// - 文件不存在：[`ParseError::NotFound`]
    /// - 无法读取（权限、非 UTF-8 等）：[`ParseError::Io`]
    /// - 严格模式下存在警告：[`ParseError::Strict`]
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Result<ScriptFile, ParseError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ParseError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ParseError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ParseError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let script = self.parse_str(path, &text);

        if self.strict && !self.warnings.is_empty() {
            return Err(ParseError::Strict {
                path: path.to_path_buf(),
                diagnostics: self.warnings.clone(),
            });
        }

        Ok(script)
    }

    /// 解析脚本文本
    ///
    /// 不会失败；无法识别的行记录在 [`Parser::warnings`] 中。
    pub fn parse_str(&mut self, path: impl AsRef<Path>, text: &str) -> ScriptFile {
        self.parse_prepared(path.as_ref(), preprocess(text))
    }

    /// 解析已经按行拆分的文本
    pub fn parse_lines<S: AsRef<str>>(&mut self, path: impl AsRef<Path>, lines: &[S]) -> ScriptFile {
        self.parse_prepared(
            path.as_ref(),
            preprocess_lines(lines.iter().map(|line| line.as_ref())),
        )
    }

    fn parse_prepared(&mut self, path: &Path, lines: Vec<Line>) -> ScriptFile {
        let script_id = path.display().to_string();
        let (events, warnings) = StructureParser::new(&script_id, &lines).parse();

        for warning in &warnings {
            warn!(target: "usk", "{}", warning);
        }

        let mut script = ScriptFile::new(path);
        script.events = events;
        self.warnings = warnings;

        debug!(
            target: "usk",
            script = %script_id,
            events = script.events.len(),
            warnings = self.warnings.len(),
            "脚本解析完成"
        );
        script
    }
}
