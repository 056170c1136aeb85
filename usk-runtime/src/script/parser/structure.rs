//! # 阶段 2：结构解析
//!
//! 根据缩进层级把预处理后的行组织成事件、条件块与动作。
//!
//! 容错解析：无法识别的行被跳过并记录警告，不会中断整个文件。

use super::helpers::{skip_required_whitespace, take_word};
use super::preprocess::Line;
use crate::diagnostic::Diagnostic;
use crate::script::ast::{ActionNode, EVERY_EVENT, EventNode, IfNode, Node};

const ELSE_LINE: &str = "else:";

/// 结构解析器
pub(super) struct StructureParser<'a> {
    lines: &'a [Line],
    index: usize,
    script_id: &'a str,
    warnings: Vec<Diagnostic>,
}

impl<'a> StructureParser<'a> {
    pub fn new(script_id: &'a str, lines: &'a [Line]) -> Self {
        Self {
            lines,
            index: 0,
            script_id,
            warnings: Vec::new(),
        }
    }

    /// 解析所有顶层事件，返回事件与警告
    pub fn parse(mut self) -> (Vec<EventNode>, Vec<Diagnostic>) {
        let mut events = Vec::new();

        while let Some(line) = self.current() {
            if line.indent_level == 0 && line.content.starts_with("event ") {
                if let Some(event) = self.parse_event() {
                    events.push(event);
                }
            } else {
                self.skip("顶层只允许事件定义");
            }
        }

        (events, self.warnings)
    }

    fn current(&self) -> Option<&'a Line> {
        self.lines.get(self.index)
    }

    fn warn(&mut self, line: &Line, message: &str) {
        self.warnings.push(
            Diagnostic::warn(self.script_id, message)
                .with_line(line.line_number)
                .with_detail(&line.content),
        );
    }

    /// 跳过当前行并记录警告
    fn skip(&mut self, message: &str) {
        if let Some(line) = self.current() {
            self.warn(line, message);
        }
        self.index += 1;
    }

    fn parse_event(&mut self) -> Option<EventNode> {
        let line = self.current()?;
        let Some((name, args)) = parse_event_header(&line.content) else {
            self.skip("无法识别的事件头");
            return None;
        };

        let mut event = EventNode::new(line.line_number, name);
        event.indent_level = line.indent_level;
        event.script_id = self.script_id.to_string();
        if name == EVERY_EVENT {
            let data = args.trim();
            if !data.is_empty() {
                event.event_data = Some(data.to_string());
            }
        } else {
            event.parameters = args
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        self.index += 1;

        event.body = self.parse_block(line.indent_level + 1);
        Some(event)
    }

    fn parse_block(&mut self, expected_indent: usize) -> Vec<Node> {
        let mut nodes = Vec::new();

        while let Some(line) = self.current() {
            if line.indent_level < expected_indent {
                break;
            }
            if line.indent_level > expected_indent {
                self.skip("缩进过深，已跳过");
                continue;
            }

            if is_if_header(&line.content) {
                if let Some(branch) = self.parse_if(expected_indent) {
                    nodes.push(Node::If(branch));
                }
            } else if line.content == ELSE_LINE {
                // 不属于本块的 else，交还给上层
                break;
            } else {
                nodes.push(Node::Action(ActionNode::new(
                    line.line_number,
                    line.indent_level,
                    line.content.as_str(),
                )));
                self.index += 1;
            }
        }

        nodes
    }

    fn parse_if(&mut self, indent: usize) -> Option<IfNode> {
        let line = self.current()?;
        let Some(condition) = parse_if_header(&line.content) else {
            self.skip("无法识别的条件头");
            return None;
        };

        let mut branch = IfNode::new(line.line_number, indent, condition);
        self.index += 1;
        branch.then_body = self.parse_block(indent + 1);

        if let Some(next) = self.current()
            && next.indent_level == indent
            && next.content == ELSE_LINE
        {
            self.index += 1;
            branch.else_body = self.parse_block(indent + 1);
        }

        Some(branch)
    }
}

/// `event <name>(<args>):`，返回 `(name, args)`
///
/// 参数部分延伸到最后一个 `)`。
pub fn parse_event_header(content: &str) -> Option<(&str, &str)> {
    let rest = skip_required_whitespace(content.strip_prefix("event")?)?;
    let (name, rest) = take_word(rest)?;
    let rest = rest.trim_start().strip_prefix('(')?;
    let args = rest
        .trim_end()
        .strip_suffix(':')?
        .trim_end()
        .strip_suffix(')')?;
    Some((name, args))
}

fn is_if_header(content: &str) -> bool {
    content.starts_with("if ") && content.ends_with(':')
}

/// `if <condition>:`，返回去掉首尾空白的条件
pub fn parse_if_header(content: &str) -> Option<&str> {
    let rest = skip_required_whitespace(content.strip_prefix("if")?)?;
    let condition = rest.trim_end().strip_suffix(':')?.trim();
    if condition.is_empty() {
        None
    } else {
        Some(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_header() {
        assert_eq!(
            parse_event_header("event player_chat(player, msg):"),
            Some(("player_chat", "player, msg"))
        );
        assert_eq!(
            parse_event_header("event every (30) :"),
            Some(("every", "30"))
        );
        assert_eq!(parse_event_header("event join():"), Some(("join", "")));
        assert_eq!(parse_event_header("event odd(a)(b):"), Some(("odd", "a)(b")));
        assert_eq!(parse_event_header("event join()"), None);
        assert_eq!(parse_event_header("event join:"), None);
        assert_eq!(parse_event_header("event (x):"), None);
    }

    #[test]
    fn test_parse_if_header() {
        assert_eq!(
            parse_if_header("if money player >= 100:"),
            Some("money player >= 100")
        );
        assert_eq!(
            parse_if_header("if startswith msg \"a:b\":"),
            Some("startswith msg \"a:b\"")
        );
        assert_eq!(parse_if_header("if  :"), None);
        assert_eq!(parse_if_header("iffy:"), None);
    }
}
