//! # 辅助解析函数
//!
//! 手写的字符串解析辅助函数，无正则依赖。
//! 动作/条件目录与结构解析器共用。

/// 单词字符：字母、数字或下划线
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 读取开头的一个单词，返回 `(单词, 剩余部分)`
///
/// 输入: `player "hi"`
/// 输出: `Some(("player", " \"hi\""))`
pub fn take_word(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !is_word_char(c)).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end..]))
}

/// 要求开头至少有一个空白字符，返回跳过空白后的部分
pub fn skip_required_whitespace(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    if trimmed.len() == s.len() {
        None
    } else {
        Some(trimmed)
    }
}

/// 读取 `<关键字><空白>` 前缀，返回剩余部分
///
/// 关键字大小写敏感。
pub fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    skip_required_whitespace(s.strip_prefix(keyword)?)
}

/// 读取 `<单词><空白>`，返回 `(单词, 剩余部分)`
pub fn take_word_then_space(s: &str) -> Option<(&str, &str)> {
    let (word, rest) = take_word(s)?;
    Some((word, skip_required_whitespace(rest)?))
}

/// 剩余部分整体是一个非空的引号字符串
///
/// 内容从第一个引号一直到最后一个引号，中间可以包含引号。
///
/// 输入: `"say "hi" twice"`
/// 输出: `Some("say \"hi\" twice")`
pub fn quoted_to_end(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    if inner.is_empty() { None } else { Some(inner) }
}

/// 拆出结尾的数字串，返回 `(前面部分, 数字)`
///
/// 数字前必须有空白；前面部分已去掉结尾空白。
pub fn split_trailing_number(s: &str) -> Option<(&str, &str)> {
    let head = s.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &s[head.len()..];
    if digits.is_empty() || !head.ends_with(char::is_whitespace) {
        return None;
    }
    Some((head.trim_end(), digits))
}

/// 非空的纯 ASCII 数字串
pub fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `\d+` 或 `\d+\.\d+` 形式的非负小数
pub fn is_decimal_literal(s: &str) -> bool {
    match s.split_once('.') {
        Some((int, frac)) => is_digits(int) && is_digits(frac),
        None => is_digits(s),
    }
}

/// 可带负号的整数
pub fn is_signed_integer(s: &str) -> bool {
    is_digits(s.strip_prefix('-').unwrap_or(s))
}

/// 计算缩进宽度：空格计 1，制表符计 4，遇到其他字符停止
pub fn indent_width(s: &str) -> usize {
    s.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(4),
            _ => None,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_word() {
        assert_eq!(take_word("player \"hi\""), Some(("player", " \"hi\"")));
        assert_eq!(take_word("some_thing2"), Some(("some_thing2", "")));
        assert_eq!(take_word(" player"), None);
        assert_eq!(take_word("\"x\""), None);
    }

    #[test]
    fn test_strip_keyword_requires_whitespace() {
        assert_eq!(strip_keyword("kill  player", "kill"), Some("player"));
        assert_eq!(strip_keyword("killplayer", "kill"), None);
        assert_eq!(strip_keyword("Kill player", "kill"), None);
    }

    #[test]
    fn test_quoted_to_end() {
        assert_eq!(quoted_to_end("\"hello\""), Some("hello"));
        assert_eq!(quoted_to_end("\"a\" and \"b\""), Some("a\" and \"b"));
        assert_eq!(quoted_to_end("\"\""), None);
        assert_eq!(quoted_to_end("\""), None);
        assert_eq!(quoted_to_end("hello"), None);
        assert_eq!(quoted_to_end("\"open"), None);
    }

    #[test]
    fn test_split_trailing_number() {
        assert_eq!(split_trailing_number("\"apple\" 5"), Some(("\"apple\"", "5")));
        assert_eq!(split_trailing_number("\"apple\"   12"), Some(("\"apple\"", "12")));
        assert_eq!(split_trailing_number("\"apple\"5"), None);
        assert_eq!(split_trailing_number("\"apple\""), None);
    }

    #[test]
    fn test_number_literals() {
        assert!(is_decimal_literal("100"));
        assert!(is_decimal_literal("99.50"));
        assert!(!is_decimal_literal("1."));
        assert!(!is_decimal_literal(".5"));
        assert!(!is_decimal_literal("-5"));
        assert!(is_signed_integer("-40"));
        assert!(is_signed_integer("7"));
        assert!(!is_signed_integer("-"));
        assert!(!is_signed_integer("+3"));
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    cancel"), 4);
        assert_eq!(indent_width("\tcancel"), 4);
        assert_eq!(indent_width("\t  cancel"), 6);
        assert_eq!(indent_width("cancel"), 0);
    }
}
