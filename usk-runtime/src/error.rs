//! # Error 模块
//!
//! 定义 usk-runtime 中使用的错误类型。
//!
//! - [`ParseError`]：单个脚本文件无法转换为 `ScriptFile`
//! - [`LoadError`]：目录级加载失败（一次 reload 只报告一个错误）
//! - [`RuntimeError`]：事件体执行期间的错误，在事件边界被捕获
//! - [`CommandError`]：环境能力执行服务器命令失败

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// 解析错误
#[derive(Error, Debug)]
pub enum ParseError {
    /// 脚本文件不存在
    #[error("脚本文件不存在: {}", path.display())]
    NotFound { path: PathBuf },

    /// 读取失败（权限、非 UTF-8 内容等）
    #[error("无法读取脚本文件 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 严格模式下存在被跳过的行
    #[error("严格模式：{} 中有 {} 处结构问题", path.display(), diagnostics.len())]
    Strict {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
}

/// 目录加载错误
#[derive(Error, Debug)]
pub enum LoadError {
    /// 无法创建脚本目录
    #[error("无法创建脚本目录 {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 目录遍历失败
    #[error("遍历脚本目录失败 {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// 某个脚本文件解析失败
    #[error("解析脚本文件失败: {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// 出错的路径
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDirectory { path, .. } | Self::Walk { path, .. } | Self::File { path, .. } => {
                path
            }
        }
    }
}

/// 服务器命令执行失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("命令 '{command}' 执行失败: {reason}")]
pub struct CommandError {
    pub command: String,
    pub reason: String,
}

impl CommandError {
    pub fn new(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// 运行时错误
///
/// 在事件边界被捕获并通过环境能力记录，不会传播给宿主。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 字面量超出目标字段范围或格式错误
    #[error("第 {line} 行：无效的字面量 - {message} ({raw})")]
    InvalidLiteral {
        line: usize,
        raw: String,
        message: String,
    },

    /// `run_command` 失败
    #[error("第 {line} 行：{source}")]
    Command {
        line: usize,
        #[source]
        source: CommandError,
    },
}

impl RuntimeError {
    /// 出错语句所在行号
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidLiteral { line, .. } | Self::Command { line, .. } => *line,
        }
    }
}

/// Result 类型别名
pub type RuntimeResult<T> = Result<T, RuntimeError>;
