//! Markdown 识别与修复规则
//!
//! 翻译服务经常在强调标记、行内代码两侧插入空格，或把半角括号换成全角括号。

use crate::utils::is_cjk;

/// 粗略判断文本是否包含 Markdown 或 LaTeX 语法
pub fn is_markdown(text: &str) -> bool {
    let patterns = [
        cached_regex!(r"(?m)^#+\s+"),
        cached_regex!(r"\[.+?\]\(.+?\)"),
        cached_regex!(r"`{1,3}[^`]+`{1,3}"),
        cached_regex!(r"\*\*.+?\*\*"),
        cached_regex!(r"\*.+?\*"),
        cached_regex!(r"_{1,2}.+?_{1,2}"),
        cached_regex!(r"(?m)^\s*[-*+]\s+"),
        cached_regex!(r"(?m)^\s*\d+\.\s+"),
        cached_regex!(r"\${1,2}[^$]+\${1,2}"),
        cached_regex!(r"\\\(.+?\\\)"),
        cached_regex!(r"\\\[.+?\\\]"),
    ];

    patterns.iter().any(|pattern| pattern.is_match(text))
}

/// 整段文本是否只是一个公式
pub fn is_formula_only(text: &str) -> bool {
    let trimmed = text.trim();
    let patterns = [
        cached_regex!(r"^\$\$[^$]+\$\$$"),
        cached_regex!(r"^\$[^$]+\$$"),
        cached_regex!(r"(?s)^\\\[.+?\\\]$"),
        cached_regex!(r"(?s)^\\\(.+?\\\)$"),
    ];

    !trimmed.is_empty() && patterns.iter().any(|pattern| pattern.is_match(trimmed))
}

/// 修复翻译引入的 Markdown 格式问题
pub fn repair_markdown(text: &str) -> String {
    // 中文强调：`_中文_` 与相邻汉字之间补空格
    let text = cached_regex!(r"(\s_[\x{4e00}-\x{9fa5}]+_)([\x{4e00}-\x{9fa5}]+)")
        .replace_all(text, "$1 $2");
    let text = cached_regex!(r"(_[\x{4e00}-\x{9fa5}]+_\s)([\x{4e00}-\x{9fa5}]+)")
        .replace_all(&text, " $1$2");
    let text = cached_regex!(r"(_[\x{4e00}-\x{9fa5}]+_)([\x{4e00}-\x{9fa5}]+)")
        .replace_all(&text, " $1 $2");

    let text = normalize_fullwidth_parens(&text);

    let text = cached_regex!(r"\*\* (.*?) \*\*").replace_all(&text, "**$1**");
    let text = cached_regex!(r"\* (.*?) \*").replace_all(&text, "*$1*");
    let text = cached_regex!(r"` (.*?) `").replace_all(&text, "`$1`");

    text.into_owned()
}

/// 括号内没有汉字时换回半角括号
///
/// 括号按栈配对，嵌套的括号对一次处理完；未配对的括号保持原样。
fn normalize_fullwidth_parens(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let mut open = Vec::new();
    let mut pairs = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '（' => open.push(i),
            '）' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, i));
                }
            }
            _ => {}
        }
    }

    for (start, end) in pairs {
        if !chars[start + 1..end].iter().copied().any(is_cjk) {
            chars[start] = '(';
            chars[end] = ')';
        }
    }

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown("# Title"));
        assert!(is_markdown("see [docs](http://a.b)"));
        assert!(is_markdown("use `cargo`"));
        assert!(is_markdown("- item"));
        assert!(is_markdown("1. first"));
        assert!(is_markdown("energy $E=mc^2$"));
        assert!(is_markdown(r"\(a\)"));
        assert!(!is_markdown("plain sentence."));
    }

    #[test]
    fn test_is_formula_only() {
        assert!(is_formula_only("  $x^2$ "));
        assert!(is_formula_only("$$\\sum_i x_i$$"));
        assert!(is_formula_only(r"\[a+b\]"));
        assert!(is_formula_only(r"\(a\)"));
        assert!(!is_formula_only("$a$ and $b$"));
        assert!(!is_formula_only("x $a$"));
        assert!(!is_formula_only(""));
    }

    #[test]
    fn test_emphasis_and_code_spacing() {
        assert_eq!(repair_markdown("a ** bold ** b"), "a **bold** b");
        assert_eq!(repair_markdown("a * it * b"), "a *it* b");
        assert_eq!(repair_markdown("run ` ls ` now"), "run `ls` now");
    }

    #[test]
    fn test_fullwidth_parentheses() {
        assert_eq!(repair_markdown("函数（x + 1）"), "函数(x + 1)");
        assert_eq!(repair_markdown("函数（见上文）"), "函数（见上文）");
    }

    #[test]
    fn test_nested_fullwidth_parentheses() {
        assert_eq!(repair_markdown("f（g（x））"), "f(g(x))");
        assert_eq!(repair_markdown("（（））"), "(())");
        assert_eq!(repair_markdown("说明（见（a））"), "说明（见(a)）");
        assert_eq!(repair_markdown("（a（b）"), "（a(b)");
        assert_eq!(repair_markdown("a）（b"), "a）（b");
    }

    #[test]
    fn test_cjk_emphasis_spacing() {
        assert_eq!(repair_markdown("这是_重点_内容"), "这是 _重点_ 内容");
    }
}
