//! 选区内容提取
//!
//! 把选区克隆到脱离页面的片段中，依次执行：
//! 1. 移除脚本、样式和复制按钮等界面元素
//! 2. 按渲染约定恢复公式源码
//! 3. 代码块、行内代码、表格转换为 Markdown
//! 4. 对 HTML 源码中残留的定界符公式做占位保护，防止被标签切碎
//! 5. 清理读屏残留文本
//! 6. 取扁平文本并还原第 4 步的占位符

use serde::{Deserialize, Serialize};

use super::detectors::DetectorSet;
use super::protector::{PlaceholderStyle, Protector};
use crate::parsers::html::{FragmentTree, HtmlFragment, SelectionRange, NOISE_CLASSES, NOISE_ELEMENTS};
use crate::parsers::math::mathjax::is_tex_script;
use crate::parsers::math::{is_lossy_residue, salvage_command, MathConvention};
use crate::translation::error::{TranslationError, TranslationResult};

/// 选区提取结果
#[derive(Debug, Clone)]
pub struct SelectionCapture<R> {
    /// 提取出的纯文本
    pub text: String,
    /// 提取时的选区，之后可能已经失效
    pub range: R,
}

/// 需要还原为 Markdown 的结构
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkdownCapabilities {
    pub code_blocks: bool,
    pub inline_code: bool,
    pub tables: bool,
}

impl Default for MarkdownCapabilities {
    fn default() -> Self {
        Self {
            code_blocks: true,
            inline_code: true,
            tables: true,
        }
    }
}

impl MarkdownCapabilities {
    pub fn none() -> Self {
        Self {
            code_blocks: false,
            inline_code: false,
            tables: false,
        }
    }
}

/// 提取器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// 启用的公式渲染约定
    pub conventions: Vec<MathConvention>,
    /// 移除脚本、样式和界面元素
    pub remove_noise: bool,
    pub markdown: MarkdownCapabilities,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            conventions: MathConvention::ALL.to_vec(),
            remove_noise: true,
            markdown: MarkdownCapabilities::default(),
        }
    }
}

/// 选区内容提取器
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(mut config: ExtractorConfig) -> Self {
        config.conventions.sort();
        config.conventions.dedup();
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// 提取选区文本
    ///
    /// 没有选区或选区为空时返回 [`TranslationError::NoSelection`]。
    pub fn extract<R: SelectionRange>(&self, range: Option<R>) -> TranslationResult<SelectionCapture<R>> {
        let range = match range {
            Some(range) if !range.is_collapsed() => range,
            _ => return Err(TranslationError::NoSelection),
        };

        let fragment = range.clone_contents();
        let text = self.extract_text(&fragment);
        tracing::info!("已提取选区文本 {} 字符", text.chars().count());

        Ok(SelectionCapture { text, range })
    }

    /// 从片段中提取文本（会修改片段）
    pub fn extract_text<T: FragmentTree>(&self, tree: &T) -> String {
        if self.config.remove_noise {
            let removed = remove_noise(tree);
            tracing::debug!("移除界面元素 {} 个", removed);
        }

        for convention in &self.config.conventions {
            convention.recover(tree);
        }

        self.recover_markdown(tree);

        let mut protector = Protector::new(PlaceholderStyle::Block);
        let root = tree.root();
        let html = tree.inner_html(&root);
        let protected = protector.protect_mapped(&html, &DetectorSet::formulas(), |snippet, _| {
            HtmlFragment::parse(snippet).text()
        });
        if !protector.is_empty() {
            tree.set_inner_html(&root, &protected);
        }

        let cleaned = sweep_residue(tree);
        if cleaned > 0 {
            tracing::debug!("清理读屏残留文本节点 {} 个", cleaned);
        }

        protector.restore(&tree.read_text(&root))
    }

    fn recover_markdown<T: FragmentTree>(&self, tree: &T) {
        let root = tree.root();
        let markdown = &self.config.markdown;

        if markdown.code_blocks {
            for pre in tree.find_all(&root, &|n| tree.is_element(n, "pre")) {
                if tree.is_attached(&pre) {
                    let fence = code_block(tree, &pre);
                    tree.replace_with_text(&pre, &fence);
                }
            }
        }

        if markdown.inline_code {
            for code in tree.find_all(&root, &|n| tree.is_element(n, "code")) {
                if !tree.is_attached(&code) || inside(tree, &code, "pre") {
                    continue;
                }
                let text = tree.read_text(&code);
                if !text.trim().is_empty() {
                    tree.replace_with_text(&code, &inline_code(&text));
                }
            }
        }

        if markdown.tables {
            // 内层表格先转换
            let tables = tree.find_all(&root, &|n| tree.is_element(n, "table"));
            for table in tables.into_iter().rev() {
                if tree.is_attached(&table) {
                    let pipe = pipe_table(tree, &table);
                    tree.replace_with_text(&table, &pipe);
                }
            }
        }
    }
}

/// 移除不承载正文的节点
fn remove_noise<T: FragmentTree>(tree: &T) -> usize {
    let root = tree.root();
    let noise = tree.find_all(&root, &|n| {
        let Some(name) = tree.local_name(n) else {
            return false;
        };
        (name == "script" && !is_tex_script(tree, n))
            || NOISE_ELEMENTS.contains(&name.as_str())
            || NOISE_CLASSES.iter().any(|class| tree.has_class(n, class))
    });

    noise
        .iter()
        .filter(|node| tree.is_attached(node))
        .filter(|node| tree.remove(node))
        .count()
}

/// 清理读屏残留：保留占位符和可识别的命令，其余清空
fn sweep_residue<T: FragmentTree>(tree: &T) -> usize {
    let placeholder = cached_regex!(r"\{\{BLOCK_\d+\}\}");
    let mut cleaned = 0;

    for node in tree.text_nodes() {
        let text = tree.read_text(&node);
        if !is_lossy_residue(&text) {
            continue;
        }

        let mut kept: Vec<&str> = placeholder.find_iter(&text).map(|m| m.as_str()).collect();
        if let Some(command) = salvage_command(&text) {
            kept.push(command);
        }
        tree.set_text(&node, &kept.join(" "));
        cleaned += 1;
    }

    cleaned
}

fn inside<T: FragmentTree>(tree: &T, node: &T::Node, name: &str) -> bool {
    let mut current = tree.parent(node);
    while let Some(parent) = current {
        if tree.is_element(&parent, name) {
            return true;
        }
        current = tree.parent(&parent);
    }
    false
}

fn code_block<T: FragmentTree>(tree: &T, pre: &T::Node) -> String {
    let language = tree
        .find_first(pre, &|n| tree.is_element(n, "code"))
        .and_then(|code| tree.attr(&code, "class"))
        .or_else(|| tree.attr(pre, "class"))
        .and_then(|classes| {
            classes.split_ascii_whitespace().find_map(|class| {
                class
                    .strip_prefix("language-")
                    .or_else(|| class.strip_prefix("lang-"))
                    .map(str::to_string)
            })
        })
        .unwrap_or_default();

    let code = tree.read_text(pre);
    format!("\n```{}\n{}\n```\n", language, code.trim_end_matches('\n'))
}

fn inline_code(text: &str) -> String {
    if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

fn pipe_table<T: FragmentTree>(tree: &T, table: &T::Node) -> String {
    let rows: Vec<Vec<String>> = tree
        .find_all(table, &|n| tree.is_element(n, "tr"))
        .iter()
        .map(|row| {
            tree.children(row)
                .iter()
                .filter(|cell| tree.is_element(cell, "td") || tree.is_element(cell, "th"))
                .map(|cell| {
                    let text = tree.read_text(cell);
                    text.split_whitespace().collect::<Vec<_>>().join(" ").replace('|', "\\|")
                })
                .collect()
        })
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    let Some(width) = rows.iter().map(Vec::len).max() else {
        return String::new();
    };

    let line = |cells: &[String]| {
        let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
        padded.resize(width, "");
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(width)));
    for row in &rows[1..] {
        lines.push(line(row));
    }

    format!("\n{}\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::HtmlSelection;

    #[test]
    fn test_collapsed_selection_is_rejected() {
        let extractor = Extractor::default();
        let err = extractor.extract(Some(HtmlSelection::new(""))).unwrap_err();
        assert_eq!(err, TranslationError::NoSelection);

        let err = extractor.extract::<HtmlSelection>(None).unwrap_err();
        assert_eq!(err, TranslationError::NoSelection);
    }

    #[test]
    fn test_noise_is_removed() {
        let fragment = HtmlFragment::parse(concat!(
            r#"<p>keep<script>var a = 1;</script><style>p{}</style>"#,
            r#"<button class="btn-copy">Copy</button> this</p>"#,
        ));
        assert_eq!(Extractor::default().extract_text(&fragment), "keep this");
    }

    #[test]
    fn test_delimited_formula_survives_markup() {
        let fragment = HtmlFragment::parse("<p>see $a <em>&lt;</em> b$ now</p>");
        assert_eq!(Extractor::default().extract_text(&fragment), "see $a < b$ now");
    }

    #[test]
    fn test_residue_is_swept() {
        let fragment = HtmlFragment::parse(r"<p>x</p><span>italic_R \mathbb{R} end_</span><span>start_ junk</span>");
        assert_eq!(Extractor::default().extract_text(&fragment), r"x\mathbb{R}");
    }

    #[test]
    fn test_markdown_recovery() {
        let fragment = HtmlFragment::parse(concat!(
            r#"<p>Run <code>ls</code>:</p>"#,
            r#"<pre><code class="language-sh">ls -la
</code></pre>"#,
            r#"<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2 | 3</td></tr></table>"#,
        ));
        let text = Extractor::default().extract_text(&fragment);

        assert_eq!(
            text,
            "Run `ls`:\n```sh\nls -la\n```\n\n| a | b |\n| --- | --- |\n| 1 | 2 \\| 3 |\n"
        );
    }

    #[test]
    fn test_markdown_capabilities_can_be_disabled() {
        let extractor = Extractor::new(ExtractorConfig {
            markdown: MarkdownCapabilities::none(),
            ..ExtractorConfig::default()
        });
        let fragment = HtmlFragment::parse("<p>Run <code>ls</code></p>");
        assert_eq!(extractor.extract_text(&fragment), "Run ls");
    }
}
