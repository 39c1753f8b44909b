//! 译文修复
//!
//! 还原占位符之后依次执行：
//! 1. 行内公式的上下标补花括号、补齐缺失的右花括号
//! 2. 行内公式中的下划线加转义，避免被 Markdown 当作强调
//! 3. Markdown 修复与中英文间距
//! 4. 空白合并，公式作为不可分割的原子
//! 5. 公式两侧与标点、正文之间的空格调整

use serde::{Deserialize, Serialize};

use super::detectors::{find_formula_spans, FormulaKind, SpanKind};
use super::markdown::repair_markdown;
use super::protector::{PlaceholderStyle, Protector};
use super::spacing::{add_cjk_latin_spacing, collapse_whitespace, tidy_cjk_punctuation};
use crate::utils::{is_closing_punctuation, is_emphasis_marker, is_opening_punctuation};

/// 修复选项
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepairOptions {
    /// 行内公式中的 `_` 转义为 `\_`
    pub escape_formula_underscores: bool,
    /// 汉字与英文字母、数字之间补空格
    pub cjk_latin_spacing: bool,
    /// 合并空白时保留换行
    pub preserve_newlines: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            escape_formula_underscores: true,
            cjk_latin_spacing: true,
            preserve_newlines: false,
        }
    }
}

/// 译文修复引擎
#[derive(Debug, Clone, Default)]
pub struct RepairEngine {
    options: RepairOptions,
}

impl RepairEngine {
    pub fn new(options: RepairOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RepairOptions {
        &self.options
    }

    /// 修复译文
    pub fn repair(&self, text: &str) -> String {
        let mut atoms = Protector::new(PlaceholderStyle::Formula);

        let atomized = self.atomize_formulas(text, &mut atoms);

        let mut body = repair_markdown(&atomized);
        if self.options.cjk_latin_spacing {
            body = add_cjk_latin_spacing(&body);
        }

        let body = collapse_whitespace(&body, self.options.preserve_newlines);
        let body = tidy_cjk_punctuation(&body);
        let body = space_around_atoms(&body);

        let repaired = atoms.restore(&body);
        tracing::debug!("修复完成：公式 {} 个，{} -> {} 字符", atoms.len(), text.len(), repaired.len());
        repaired
    }

    /// 修复行内公式并把全部公式替换为原子
    fn atomize_formulas(&self, text: &str, atoms: &mut Protector) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for span in find_formula_spans(text) {
            out.push_str(&text[cursor..span.range.start]);
            let formula = &text[span.range.clone()];

            let formula = match span.kind {
                FormulaKind::Inline => self.repair_inline(formula),
                FormulaKind::Display => formula.to_string(),
            };

            out.push_str(&atoms.mint(formula, SpanKind::Formula(span.kind)));
            cursor = span.range.end;
        }
        out.push_str(&text[cursor..]);

        out
    }

    fn repair_inline(&self, formula: &str) -> String {
        let (open, close) = if formula.starts_with("\\(") {
            ("\\(", "\\)")
        } else {
            ("$", "$")
        };
        let Some(body) = formula
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        else {
            return formula.to_string();
        };

        let mut body = balance_braces(&brace_scripts(body));
        if self.options.escape_formula_underscores {
            body = escape_underscores(&body);
        }

        format!("{}{}{}", open, body, close)
    }
}

/// 为 `_`、`^` 的参数补花括号
///
/// 参数为命令（`\alpha`）时整个命令进括号，缺少参数时补空括号；
/// 同一底数的连续上下标之间的空白被删去。
pub fn brace_scripts(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            out.push(c);
            if let Some(&next) = chars.get(i + 1) {
                out.push(next);
            }
            i += 2;
            continue;
        }

        if c != '_' && c != '^' {
            out.push(c);
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
        while chars.get(i).is_some_and(|ch| ch.is_whitespace()) {
            i += 1;
        }

        match chars.get(i) {
            None => out.push_str("{}"),
            Some('{') => continue,
            Some('_' | '^' | '}') => out.push_str("{}"),
            Some('\\') => {
                let start = i;
                i += 1;
                while chars.get(i).is_some_and(|ch| ch.is_ascii_alphabetic()) {
                    i += 1;
                }
                if i == start + 1 && i < chars.len() {
                    // `\{`、`\,` 之类的单字符命令
                    i += 1;
                }
                out.push('{');
                out.extend(&chars[start..i]);
                out.push('}');
            }
            Some(&arg) => {
                out.push('{');
                out.push(arg);
                out.push('}');
                i += 1;
            }
        }

        // 连续的上下标紧贴在一起
        let mut j = i;
        while chars.get(j).is_some_and(|ch| ch.is_whitespace()) {
            j += 1;
        }
        if matches!(chars.get(j), Some('_' | '^')) {
            i = j;
        }
    }

    out
}

/// 在末尾补齐未闭合的 `{`
pub fn balance_braces(body: &str) -> String {
    let mut depth = 0usize;
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    let mut out = body.to_string();
    out.extend(std::iter::repeat('}').take(depth));
    out
}

/// 转义未转义的下划线
pub fn escape_underscores(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 4);
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                out.push(c);
                escaped = true;
            }
            '_' => out.push_str("\\_"),
            _ => out.push(c),
        }
    }

    out
}

/// 公式原子两侧的空格：紧邻标点不留空格，紧邻正文补一个空格
///
/// 紧贴强调标记的公式保持原样，`**$a$**` 仍是粗体。
fn space_around_atoms(text: &str) -> String {
    let atom = cached_regex!(r"\{\{FORMULA_\d+\}\}");
    let mut out = String::with_capacity(text.len() + 16);
    let mut cursor = 0;

    for m in atom.find_iter(text) {
        let before = &text[cursor..m.start()];
        let trimmed = before.trim_end_matches(' ');
        let prev = trimmed.chars().next_back().or_else(|| out.chars().next_back());

        match prev {
            Some(p) if is_opening_punctuation(p) => out.push_str(trimmed),
            Some(p) if p.is_whitespace() || is_emphasis_marker(p) => out.push_str(before),
            Some(_) => {
                out.push_str(trimmed);
                out.push(' ');
            }
            None => out.push_str(trimmed),
        }

        out.push_str(m.as_str());

        let after = &text[m.end()..];
        let rest = after.trim_start_matches(' ');
        match rest.chars().next() {
            Some(n) if is_closing_punctuation(n) => cursor = m.end() + (after.len() - rest.len()),
            Some(n) if n.is_whitespace() || is_emphasis_marker(n) => cursor = m.end(),
            Some(_) => {
                out.push(' ');
                cursor = m.end() + (after.len() - rest.len());
            }
            None => cursor = m.end() + (after.len() - rest.len()),
        }
    }

    out.push_str(&text[cursor..]);
    out
}
