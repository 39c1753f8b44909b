//! Markdown 与公式渲染
//!
//! 渲染前先把公式换成 `{{MATH_n}}` 占位符，Markdown 渲染完成后再把占位符替换为
//! 交给前端排版器的公式节点，避免 Markdown 把 `_`、`*` 当作强调。

use std::ops::Range;

use pulldown_cmark::{html, Options, Parser};

use crate::parsers::html::escape_html;
use crate::translation::pipeline::{find_formula_spans, FormulaKind, PlaceholderStyle, Protector, SpanKind};

/// 公式排版
pub trait MathTypesetter: Send + Sync {
    /// `source` 不含定界符
    fn typeset(&self, source: &str, kind: FormulaKind) -> String;
}

/// Markdown 渲染
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// 输出带定界符的公式节点，由页面上的排版器（KaTeX/MathJax 自动渲染）接管
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterMathTypesetter;

impl MathTypesetter for DelimiterMathTypesetter {
    fn typeset(&self, source: &str, kind: FormulaKind) -> String {
        // 修复阶段为 Markdown 加的转义，排版器不需要
        let source = escape_html(&source.replace("\\_{", "_{"));
        match kind {
            FormulaKind::Inline => format!(r#"<span class="math inline">\({}\)</span>"#, source),
            // 环境自带显示模式
            FormulaKind::Display if source.starts_with("\\begin{") => {
                format!(r#"<div class="math display">{}</div>"#, source)
            }
            FormulaKind::Display => format!(r#"<div class="math display">\[{}\]</div>"#, source),
        }
    }
}

/// 基于 pulldown-cmark 的渲染器
#[derive(Debug, Clone)]
pub struct PulldownRenderer<M = DelimiterMathTypesetter> {
    typesetter: M,
    options: Options,
}

impl Default for PulldownRenderer {
    fn default() -> Self {
        Self::new(DelimiterMathTypesetter)
    }
}

impl<M: MathTypesetter> PulldownRenderer<M> {
    pub fn new(typesetter: M) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { typesetter, options }
    }
}

impl<M: MathTypesetter> MarkdownRenderer for PulldownRenderer<M> {
    fn render(&self, markdown: &str) -> String {
        let mut protector = Protector::new(PlaceholderStyle::Math);
        let protected = protect_math(markdown, &mut protector);

        let mut out = String::with_capacity(protected.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(&protected, self.options));

        let rendered = protector.restore_with(&out, |span| match span.kind {
            SpanKind::Formula(kind) => self.typesetter.typeset(strip_delimiters(&span.original), kind),
            _ => escape_html(&span.original),
        });
        tracing::debug!("渲染完成：公式 {} 个", protector.len());
        rendered
    }
}

/// 代码以外的公式换成占位符
fn protect_math(text: &str, protector: &mut Protector) -> String {
    let code = code_ranges(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for span in find_formula_spans(text) {
        if code.iter().any(|c| c.start < span.range.end && span.range.start < c.end) {
            continue;
        }
        out.push_str(&text[cursor..span.range.start]);
        let original = text[span.range.clone()].to_string();
        out.push_str(&protector.mint(original, SpanKind::Formula(span.kind)));
        cursor = span.range.end;
    }
    out.push_str(&text[cursor..]);

    out
}

fn code_ranges(text: &str) -> Vec<Range<usize>> {
    let fenced = cached_regex!(r"(?s)```.*?```");
    let inline = cached_regex!(r"`[^`\n]+`");

    let mut ranges: Vec<Range<usize>> = fenced.find_iter(text).map(|m| m.range()).collect();
    for m in inline.find_iter(text) {
        if !ranges.iter().any(|r| r.start <= m.start() && m.end() <= r.end) {
            ranges.push(m.range());
        }
    }
    ranges
}

fn strip_delimiters(formula: &str) -> &str {
    let pairs = [("$$", "$$"), ("\\[", "\\]"), ("\\(", "\\)"), ("$", "$")];
    pairs
        .iter()
        .find_map(|(open, close)| {
            formula
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
        })
        .unwrap_or(formula)
        .trim()
}
