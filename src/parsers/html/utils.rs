/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 复制按钮、遮罩层、编辑器等界面元素的类名，提取文本时整体移除
pub const NOISE_CLASSES: &[&str] = &[
    "html2md-panel",
    "div-btn-copy",
    "btn-copy",
    "overlay",
    "monaco-editor",
];

/// 不承载正文的元素
pub const NOISE_ELEMENTS: &[&str] = &["style", "noscript", "template"];

/// 检查字符串是否只由 ASCII 空白组成
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| WHITESPACES.contains(&c))
}

/// 转义 HTML 文本中的特殊字符
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t"));
        assert!(!is_blank(" a "));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
