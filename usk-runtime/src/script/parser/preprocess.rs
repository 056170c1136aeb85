//! # 阶段 1：行预处理
//!
//! 去除注释与空行，计算每一行的缩进层级。

use super::helpers::indent_width;

/// 每一级缩进的列宽
pub const INDENT_WIDTH: usize = 4;

/// 注释标记，到行尾为止（引号内也不例外）
pub const COMMENT_MARKER: char = '#';

/// 预处理后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 源文件行号（从 1 开始）
    pub line_number: usize,
    /// 缩进层级（列宽整除 [`INDENT_WIDTH`]）
    pub indent_level: usize,
    /// 去掉缩进后的内容
    pub content: String,
}

/// 预处理整段文本
pub fn preprocess(text: &str) -> Vec<Line> {
    preprocess_lines(text.lines())
}

/// 预处理已经按行拆分的文本
pub fn preprocess_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Line> {
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let code = match raw.find(COMMENT_MARKER) {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let code = code.trim_end();
            if code.trim_start().is_empty() {
                return None;
            }
            Some(Line {
                line_number: idx + 1,
                indent_level: indent_width(code) / INDENT_WIDTH,
                content: code.trim_start().to_string(),
            })
        })
        .collect()
}
