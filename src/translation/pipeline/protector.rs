//! 占位符保护
//!
//! 翻译前把公式、代码和 Markdown 结构替换为 `{{PREFIX_n}}` 形式的占位符，
//! 翻译后再换回原文。每次翻译尝试都应构造独立的 [`Protector`]，
//! 不同尝试之间不共享占位符表。

use std::collections::BTreeMap;

use super::detectors::{DetectorSet, SpanKind};

/// 占位符样式
///
/// 不同阶段使用不同前缀，彼此的占位符不会被误还原。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// 翻译请求中的受保护片段
    Block,
    /// 修复阶段的公式原子
    Formula,
    /// 渲染阶段的公式原子
    Math,
}

impl PlaceholderStyle {
    pub fn prefix(self) -> &'static str {
        match self {
            PlaceholderStyle::Block => "BLOCK",
            PlaceholderStyle::Formula => "FORMULA",
            PlaceholderStyle::Math => "MATH",
        }
    }

    pub fn placeholder(self, index: usize) -> String {
        format!("{{{{{}_{}}}}}", self.prefix(), index)
    }
}

/// 一个被保护的片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub placeholder: String,
    pub original: String,
    pub kind: SpanKind,
}

enum Segment {
    Text(String),
    Protected(String),
}

/// 占位符保护器
#[derive(Debug)]
pub struct Protector {
    style: PlaceholderStyle,
    spans: BTreeMap<usize, ProtectedSpan>,
    counter: usize,
}

impl Default for Protector {
    fn default() -> Self {
        Self::new(PlaceholderStyle::Block)
    }
}

impl Protector {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            spans: BTreeMap::new(),
            counter: 0,
        }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// 用占位符替换文本中所有匹配的片段
    pub fn protect(&mut self, text: &str, detectors: &DetectorSet) -> String {
        self.protect_mapped(text, detectors, |matched, _| matched.to_string())
    }

    /// 同 [`protect`](Self::protect)，但记录的原文先经过 `map` 转换
    ///
    /// 在 HTML 源码上做保护时用它把实体解码后的文本记为原文。
    pub fn protect_mapped<F>(&mut self, text: &str, detectors: &DetectorSet, map: F) -> String
    where
        F: Fn(&str, SpanKind) -> String,
    {
        // 文本里已有的同前缀占位符不能被新编号撞上
        self.skip_existing_indices(text);

        let before = self.spans.len();
        let mut segments = vec![Segment::Text(text.to_string())];

        for tier in detectors.tiers() {
            let mut next = Vec::with_capacity(segments.len());

            for segment in segments {
                let content = match segment {
                    Segment::Text(content) => content,
                    protected => {
                        next.push(protected);
                        continue;
                    }
                };

                let mut pos = 0;
                while let Some((range, kind)) = tier.find_at(&content, pos) {
                    if range.start > pos {
                        next.push(Segment::Text(content[pos..range.start].to_string()));
                    }
                    let original = map(&content[range.clone()], kind);
                    next.push(Segment::Protected(self.mint(original, kind)));
                    pos = range.end;
                }
                if pos < content.len() {
                    next.push(Segment::Text(content[pos..].to_string()));
                }
            }

            segments = next;
        }

        tracing::debug!(
            "保护片段 {} 个（前缀 {}）",
            self.spans.len() - before,
            self.style.prefix()
        );

        segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) | Segment::Protected(text) => text,
            })
            .collect()
    }

    /// 登记一个片段并返回它的占位符
    pub fn mint(&mut self, original: String, kind: SpanKind) -> String {
        let index = self.counter;
        self.counter += 1;

        let placeholder = self.style.placeholder(index);
        self.spans.insert(
            index,
            ProtectedSpan {
                placeholder: placeholder.clone(),
                original,
                kind,
            },
        );
        placeholder
    }

    fn skip_existing_indices(&mut self, text: &str) {
        for caps in placeholder_regex().captures_iter(text) {
            if &caps[1] != self.style.prefix() {
                continue;
            }
            if let Ok(index) = caps[2].parse::<usize>() {
                if index >= self.counter && !self.spans.contains_key(&index) {
                    self.counter = index.saturating_add(1);
                }
            }
        }
    }

    /// 把占位符换回原文
    ///
    /// 每处出现都会还原；没有记录的占位符原样保留。
    pub fn restore(&self, text: &str) -> String {
        self.restore_with(text, |span| span.original.clone())
    }

    /// 用自定义方式替换每个已登记的占位符
    pub fn restore_with<F>(&self, text: &str, replace: F) -> String
    where
        F: Fn(&ProtectedSpan) -> String,
    {
        let mut restored = 0usize;
        let mut missing = 0usize;

        let result = placeholder_regex().replace_all(text, |caps: &regex::Captures| {
            let span = (&caps[1] == self.style.prefix())
                .then(|| caps[2].parse::<usize>().ok())
                .flatten()
                .and_then(|index| self.spans.get(&index));

            match span {
                Some(span) => {
                    restored += 1;
                    replace(span)
                }
                None => {
                    if &caps[1] == self.style.prefix() {
                        missing += 1;
                    }
                    caps[0].to_string()
                }
            }
        });

        if missing > 0 {
            tracing::warn!("有 {} 个占位符没有对应的原文，保持原样", missing);
        }
        tracing::debug!("还原占位符 {} 处", restored);

        result.into_owned()
    }

    /// 清空片段表和计数器
    pub fn clear(&mut self) {
        self.spans.clear();
        self.counter = 0;
    }

    pub fn spans(&self) -> impl Iterator<Item = &ProtectedSpan> {
        self.spans.values()
    }

    pub fn get(&self, placeholder: &str) -> Option<&ProtectedSpan> {
        self.spans.values().find(|span| span.placeholder == placeholder)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// 占位符，容忍翻译服务在花括号内插入的空白
fn placeholder_regex() -> &'static regex::Regex {
    cached_regex!(r"\{\{\s*([A-Z]+)_(\d+)\s*\}\}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::pipeline::detectors::FormulaKind;

    #[test]
    fn test_protect_and_restore() {
        let mut protector = Protector::default();
        let text = r"Let $x^2$ be \(y\) in $$\sum_i a_i$$ with `code`.";
        let protected = protector.protect(text, &DetectorSet::translation());

        assert_eq!(
            protected,
            "Let {{BLOCK_1}} be {{BLOCK_2}} in {{BLOCK_0}} with {{BLOCK_3}}."
        );
        assert_eq!(protector.restore(&protected), text);
    }

    #[test]
    fn test_span_kinds() {
        let mut protector = Protector::default();
        protector.protect(r"$$a$$ $b$ `c` [d](http://e)", &DetectorSet::translation());

        let kinds: Vec<SpanKind> = protector.spans().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::Formula(FormulaKind::Display),
                SpanKind::Formula(FormulaKind::Inline),
                SpanKind::Code,
                SpanKind::Markdown,
            ]
        );
    }

    #[test]
    fn test_inline_never_matches_inside_display() {
        let mut protector = Protector::default();
        let protected = protector.protect(r"$$a $b$ c$$", &DetectorSet::formulas());
        assert_eq!(protected, "{{BLOCK_0}}");
        assert_eq!(protector.len(), 1);
    }

    #[test]
    fn test_restore_every_occurrence_and_tolerate_spaces() {
        let mut protector = Protector::default();
        let protected = protector.protect("see $x$", &DetectorSet::formulas());
        assert_eq!(protected, "see {{BLOCK_0}}");

        let duplicated = "{{BLOCK_0}} and {{ BLOCK_0 }}";
        assert_eq!(protector.restore(duplicated), "$x$ and $x$");
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let protector = Protector::default();
        assert_eq!(protector.restore("a {{BLOCK_7}} b"), "a {{BLOCK_7}} b");
    }

    #[test]
    fn test_other_prefix_is_not_restored() {
        let mut block = Protector::new(PlaceholderStyle::Block);
        let mut formula = Protector::new(PlaceholderStyle::Formula);
        let a = block.protect("$a$", &DetectorSet::formulas());
        let b = formula.protect("$b$", &DetectorSet::formulas());
        let joined = format!("{} {}", a, b);

        assert_eq!(block.restore(&joined), "$a$ {{FORMULA_0}}");
        assert_eq!(formula.restore(&joined), "{{BLOCK_0}} $b$");
    }

    #[test]
    fn test_existing_placeholder_text_is_not_reused() {
        let mut protector = Protector::default();
        let text = "literal {{BLOCK_0}} then $x$";
        let protected = protector.protect(text, &DetectorSet::formulas());

        assert_eq!(protected, "literal {{BLOCK_0}} then {{BLOCK_1}}");
        assert_eq!(protector.restore(&protected), text);
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut protector = Protector::default();
        protector.protect("$a$ $b$", &DetectorSet::formulas());
        protector.clear();

        assert!(protector.is_empty());
        assert_eq!(protector.protect("$c$", &DetectorSet::formulas()), "{{BLOCK_0}}");
        assert_eq!(protector.restore("{{BLOCK_1}}"), "{{BLOCK_1}}");
    }

    #[test]
    fn test_protect_mapped_records_decoded_text() {
        let mut protector = Protector::default();
        let protected = protector.protect_mapped("$a &lt; b$", &DetectorSet::formulas(), |m, _| {
            m.replace("&lt;", "<")
        });
        assert_eq!(protected, "{{BLOCK_0}}");
        assert_eq!(protector.restore(&protected), "$a < b$");
    }
}
