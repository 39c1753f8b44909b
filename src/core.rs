//! 命令行辅助功能
//!
//! 读取输入并识别字符集、从 HTML 片段提取文本、渲染结果视图以及终端输出。

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};

use crate::parsers::html::HtmlSelection;
use crate::presentation::{MarkdownRenderer, PulldownRenderer, TranslationView};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::{Extractor, ExtractorConfig};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// 只在开头这么多字节里查找 `<meta charset>`
const CHARSET_SNIFF_LIMIT: usize = 1024;

/// 输入内容的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 选区的 HTML 源码
    Html,
    /// 已经是纯文本
    Text,
}

impl InputKind {
    /// 含有形如 `<p>`、`</span>` 或 `<br/>` 的标签即视为 HTML
    pub fn detect(input: &str) -> Self {
        if cached_regex!(r"(?i)</?[a-z][a-z0-9-]*(?:\s[^<>]*)?/?>").is_match(input) {
            InputKind::Html
        } else {
            InputKind::Text
        }
    }
}

/// 按字符集解码输入字节
///
/// 优先级：BOM > 显式指定 > `<meta charset>` > UTF-8。
pub fn decode_input(data: &[u8], encoding: Option<&str>) -> String {
    let declared = encoding.and_then(|label| {
        let found = Encoding::for_label(label.trim().as_bytes());
        if found.is_none() {
            tracing::warn!("未知的字符集 '{}'，改用自动识别", label);
        }
        found
    });

    let encoding = declared.or_else(|| sniff_charset(data)).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(data);
    if had_errors {
        tracing::warn!("输入中有无法按 {} 解码的字节，已替换", used.name());
    }
    text.into_owned()
}

fn sniff_charset(data: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&data[..data.len().min(CHARSET_SNIFF_LIMIT)]);
    let caps = cached_regex!(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_.:-]+)"#).captures(&head)?;
    Encoding::for_label_no_replacement(caps[1].as_bytes())
}

/// 读取输入：路径为空或为 `-` 时读取标准输入
pub fn read_input(path: Option<&Path>, encoding: Option<&str>) -> TranslationResult<String> {
    let data = match path {
        Some(path) if path.as_os_str() != "-" => fs::read(path)
            .map_err(|e| TranslationError::from(e).with_context(format!("读取 {}", path.display())))?,
        _ => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };

    Ok(decode_input(&data, encoding))
}

/// 从输入中取出待翻译文本
///
/// HTML 输入视为一个选区，经过完整的提取流程；纯文本只去掉首尾空白。
pub fn extract_input(input: &str, config: &ExtractorConfig) -> TranslationResult<String> {
    match InputKind::detect(input) {
        InputKind::Html => {
            let extractor = Extractor::new(config.clone());
            let capture = extractor.extract(Some(HtmlSelection::new(input)))?;
            Ok(capture.text)
        }
        InputKind::Text if input.trim().is_empty() => Err(TranslationError::NoSelection),
        InputKind::Text => Ok(input.trim().to_string()),
    }
}

/// 把修复后的译文渲染为完整的结果视图
pub fn render_result_view(text: &str) -> String {
    let html = PulldownRenderer::default().render(text);
    TranslationView::result(html, text).to_html()
}

/// 写到文件，路径为空或为 `-` 时写到标准输出
pub fn write_output(path: Option<&Path>, content: &str) -> TranslationResult<()> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::write(path, content)
                .map_err(|e| TranslationError::from(e).with_context(format!("写入 {}", path.display())))?;
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str) {
    eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
}

/// Prints an info message to stderr
pub fn print_info_message(msg: &str) {
    eprintln!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_input_kind() {
        assert_eq!(InputKind::detect("<p>Hello</p>"), InputKind::Html);
        assert_eq!(InputKind::detect("line<br/>break"), InputKind::Html);
        assert_eq!(InputKind::detect("if $a<b$ and $c>d$"), InputKind::Text);
        assert_eq!(InputKind::detect("plain **markdown**"), InputKind::Text);
    }

    #[test]
    fn test_decode_explicit_label() {
        assert_eq!(decode_input(b"caf\xe9", Some("windows-1252")), "café");
    }

    #[test]
    fn test_decode_meta_charset() {
        let bytes = b"<meta charset=\"iso-8859-1\"><p>na\xefve</p>";
        assert!(decode_input(bytes, None).contains("naïve"));
    }

    #[test]
    fn test_decode_bom_wins() {
        let bytes = b"\xef\xbb\xbfcaf\xc3\xa9";
        assert_eq!(decode_input(bytes, Some("windows-1252")), "café");
    }

    #[test]
    fn test_decode_unknown_label_falls_back() {
        assert_eq!(decode_input("数学".as_bytes(), Some("no-such-charset")), "数学");
    }

    #[test]
    fn test_extract_plain_text() {
        let config = ExtractorConfig::default();
        assert_eq!(extract_input("  Let $x$ be real.\n", &config).unwrap(), "Let $x$ be real.");
        assert!(matches!(
            extract_input(" \n ", &config),
            Err(TranslationError::NoSelection)
        ));
    }

    #[test]
    fn test_extract_html_fragment() {
        let html = r#"<p>Run <code>cargo</code> now</p><script>alert(1)</script>"#;
        let text = extract_input(html, &ExtractorConfig::default()).unwrap();
        assert!(text.contains("Run `cargo` now"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        write_output(Some(&path), "<p>x</p>").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>x</p>");
    }
}
