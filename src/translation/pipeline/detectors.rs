//! 受保护片段的识别规则
//!
//! 识别规则按层级组织：行间公式、行内公式、代码、Markdown 结构。
//! 层级按顺序扫描，后面的层级看不到前面层级已经占用的文本；
//! 同一层级内取最靠左的匹配，起点相同时按规则顺序取第一个。

use std::ops::Range;

use regex::Regex;

/// 公式的显示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaKind {
    /// 行间（块级）公式
    Display,
    /// 行内公式
    Inline,
}

impl FormulaKind {
    /// 按内容判断公式类型：含块环境或 `\[` 的为行间公式
    pub fn classify(source: &str) -> Self {
        if source.contains("\\begin{") || source.contains("\\[") {
            FormulaKind::Display
        } else {
            FormulaKind::Inline
        }
    }

    /// 用与类型一致的定界符包裹公式源码
    pub fn wrap(self, source: &str) -> String {
        match self {
            FormulaKind::Display => format!("$${}$$", source),
            FormulaKind::Inline => format!("${}$", source),
        }
    }
}

/// 受保护片段的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Formula(FormulaKind),
    Code,
    Markdown,
}

/// 匹配方式
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Pattern(fn() -> &'static Regex),
    /// 与 `Pattern` 相同，但起始字符前有反斜杠转义时不算匹配
    Unescaped(fn() -> &'static Regex),
    /// `\begin{name}…\end{name}`，同名环境可嵌套
    Environment,
}

/// 单条识别规则
#[derive(Debug, Clone)]
pub struct Detector {
    name: &'static str,
    kind: SpanKind,
    matcher: Matcher,
}

impl Detector {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// 从 `start` 起查找第一个匹配
    pub fn find_at(&self, text: &str, start: usize) -> Option<Range<usize>> {
        match self.matcher {
            Matcher::Pattern(regex) => regex()
                .find_at(text, start)
                .map(|m| m.range())
                .filter(|range| !range.is_empty()),
            Matcher::Unescaped(regex) => {
                let mut from = start;
                while let Some(m) = regex().find_at(text, from) {
                    if !text[..m.start()].ends_with('\\') {
                        return Some(m.range()).filter(|range| !range.is_empty());
                    }
                    from = m.start() + 1;
                }
                None
            }
            Matcher::Environment => find_environment(text, start),
        }
    }

    pub fn display_dollars() -> Self {
        Self {
            name: "display-dollars",
            kind: SpanKind::Formula(FormulaKind::Display),
            matcher: Matcher::Pattern(|| cached_regex!(r"(?s)\$\$.+?\$\$")),
        }
    }

    pub fn display_brackets() -> Self {
        Self {
            name: "display-brackets",
            kind: SpanKind::Formula(FormulaKind::Display),
            matcher: Matcher::Pattern(|| cached_regex!(r"(?s)\\\[.+?\\\]")),
        }
    }

    pub fn environment() -> Self {
        Self {
            name: "environment",
            kind: SpanKind::Formula(FormulaKind::Display),
            matcher: Matcher::Environment,
        }
    }

    pub fn inline_dollars() -> Self {
        Self {
            name: "inline-dollars",
            kind: SpanKind::Formula(FormulaKind::Inline),
            matcher: Matcher::Unescaped(|| cached_regex!(r"\$(?:\\.|[^$\\])+?\$")),
        }
    }

    pub fn inline_parens() -> Self {
        Self {
            name: "inline-parens",
            kind: SpanKind::Formula(FormulaKind::Inline),
            matcher: Matcher::Pattern(|| cached_regex!(r"(?s)\\\(.+?\\\)")),
        }
    }

    pub fn fenced_code() -> Self {
        Self {
            name: "fenced-code",
            kind: SpanKind::Code,
            matcher: Matcher::Pattern(|| cached_regex!(r"(?s)```.*?```")),
        }
    }

    pub fn inline_code() -> Self {
        Self {
            name: "inline-code",
            kind: SpanKind::Code,
            matcher: Matcher::Pattern(|| cached_regex!(r"`[^`\n]+`")),
        }
    }

    pub fn link_target() -> Self {
        Self {
            name: "link-target",
            kind: SpanKind::Markdown,
            matcher: Matcher::Pattern(|| cached_regex!(r"\]\([^()\s]+\)")),
        }
    }

    pub fn html_tag() -> Self {
        Self {
            name: "html-tag",
            kind: SpanKind::Markdown,
            matcher: Matcher::Pattern(|| cached_regex!(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>")),
        }
    }
}

/// 查找同名配对的环境块
fn find_environment(text: &str, start: usize) -> Option<Range<usize>> {
    let begin = cached_regex!(r"\\begin\{([A-Za-z]+\*?)\}");
    let mut search_from = start;

    while let Some(caps) = begin.captures_at(text, search_from) {
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        let open = format!("\\begin{{{}}}", name);
        let close = format!("\\end{{{}}}", name);

        let mut depth = 1usize;
        let mut pos = whole.end();
        loop {
            let next_open = text[pos..].find(&open).map(|i| i + pos);
            let next_close = text[pos..].find(&close).map(|i| i + pos);
            match (next_open, next_close) {
                (Some(o), Some(c)) if o < c => {
                    depth += 1;
                    pos = o + open.len();
                }
                (_, Some(c)) => {
                    depth -= 1;
                    pos = c + close.len();
                    if depth == 0 {
                        return Some(whole.start()..pos);
                    }
                }
                (_, None) => break,
            }
        }

        // 没有闭合的环境不构成匹配，继续向后找
        search_from = whole.end();
    }

    None
}

/// 一个层级：层级内的规则互相竞争最靠左的位置
#[derive(Debug, Clone)]
pub struct DetectorTier {
    name: &'static str,
    detectors: Vec<Detector>,
}

impl DetectorTier {
    pub fn new(name: &'static str, detectors: Vec<Detector>) -> Self {
        Self { name, detectors }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// 从 `start` 起最靠左的匹配；起点相同时规则顺序靠前者胜出
    pub fn find_at(&self, text: &str, start: usize) -> Option<(Range<usize>, SpanKind)> {
        let mut best: Option<(Range<usize>, SpanKind)> = None;

        for detector in &self.detectors {
            if let Some(range) = detector.find_at(text, start) {
                let better = match &best {
                    Some((current, _)) => range.start < current.start,
                    None => true,
                };
                if better {
                    best = Some((range, detector.kind()));
                }
            }
        }

        best
    }
}

/// 按优先级排列的识别层级
#[derive(Debug, Clone)]
pub struct DetectorSet {
    tiers: Vec<DetectorTier>,
}

impl DetectorSet {
    pub fn new(tiers: Vec<DetectorTier>) -> Self {
        Self { tiers }
    }

    pub fn display_tier() -> DetectorTier {
        DetectorTier::new(
            "display",
            vec![
                Detector::display_dollars(),
                Detector::display_brackets(),
                Detector::environment(),
            ],
        )
    }

    pub fn inline_tier() -> DetectorTier {
        DetectorTier::new(
            "inline",
            vec![Detector::inline_dollars(), Detector::inline_parens()],
        )
    }

    /// 只识别公式
    pub fn formulas() -> Self {
        Self::new(vec![Self::display_tier(), Self::inline_tier()])
    }

    /// 翻译前使用的完整规则：公式、代码、Markdown 结构
    pub fn translation() -> Self {
        Self::new(vec![
            Self::display_tier(),
            Self::inline_tier(),
            DetectorTier::new(
                "code",
                vec![Detector::fenced_code(), Detector::inline_code()],
            ),
            DetectorTier::new(
                "structural",
                vec![Detector::link_target(), Detector::html_tag()],
            ),
        ])
    }

    pub fn tiers(&self) -> &[DetectorTier] {
        &self.tiers
    }
}

/// 文本中的一个公式片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaSpan {
    pub range: Range<usize>,
    pub kind: FormulaKind,
}

/// 按 [`DetectorSet::formulas`] 的层级规则列出文本中的全部公式，按位置排序
pub fn find_formula_spans(text: &str) -> Vec<FormulaSpan> {
    let mut claimed: Vec<FormulaSpan> = Vec::new();

    for tier in DetectorSet::formulas().tiers() {
        let free = free_ranges(text.len(), &claimed);
        let mut found = Vec::new();

        for gap in free {
            let segment = &text[gap.clone()];
            let mut pos = 0;
            while let Some((range, kind)) = tier.find_at(segment, pos) {
                if let SpanKind::Formula(kind) = kind {
                    found.push(FormulaSpan {
                        range: (gap.start + range.start)..(gap.start + range.end),
                        kind,
                    });
                }
                pos = range.end;
            }
        }

        claimed.extend(found);
    }

    claimed.sort_by_key(|span| span.range.start);
    claimed
}

/// 已占用区间之外的空隙
fn free_ranges(len: usize, claimed: &[FormulaSpan]) -> Vec<Range<usize>> {
    let mut taken: Vec<Range<usize>> = claimed.iter().map(|s| s.range.clone()).collect();
    taken.sort_by_key(|r| r.start);

    let mut gaps = Vec::new();
    let mut cursor = 0;
    for range in taken {
        if range.start > cursor {
            gaps.push(cursor..range.start);
        }
        cursor = cursor.max(range.end);
    }
    if cursor < len {
        gaps.push(cursor..len);
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_content() {
        assert_eq!(
            FormulaKind::classify(r"\begin{aligned}a&=b\end{aligned}"),
            FormulaKind::Display
        );
        assert_eq!(FormulaKind::classify(r"\[x\]"), FormulaKind::Display);
        assert_eq!(FormulaKind::classify(r"x^2"), FormulaKind::Inline);
        assert_eq!(FormulaKind::Display.wrap("a"), "$$a$$");
        assert_eq!(FormulaKind::Inline.wrap("a"), "$a$");
    }

    #[test]
    fn test_inline_dollars_skip_escaped() {
        let detector = Detector::inline_dollars();
        let text = r"cost \$5 and $a\$b$ end";
        let range = detector.find_at(text, 0).unwrap();
        assert_eq!(&text[range], r"$a\$b$");
    }

    #[test]
    fn test_nested_environment() {
        let text = r"x \begin{a}\begin{a}1\end{a}2\end{a} y";
        let range = Detector::environment().find_at(text, 0).unwrap();
        assert_eq!(&text[range], r"\begin{a}\begin{a}1\end{a}2\end{a}");
    }

    #[test]
    fn test_unclosed_environment_is_skipped() {
        let text = r"\begin{a} open \begin{b}x\end{b}";
        let range = Detector::environment().find_at(text, 0).unwrap();
        assert_eq!(&text[range], r"\begin{b}x\end{b}");
    }

    #[test]
    fn test_tier_prefers_leftmost_then_order() {
        let tier = DetectorSet::display_tier();
        let text = r"a \[x\] $$y$$";
        let (range, _) = tier.find_at(text, 0).unwrap();
        assert_eq!(&text[range], r"\[x\]");
    }

    #[test]
    fn test_formula_spans_do_not_nest() {
        let text = r"$$a $b$ c$$ and $d$";
        let spans = find_formula_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].range.clone()], r"$$a $b$ c$$");
        assert_eq!(spans[0].kind, FormulaKind::Display);
        assert_eq!(&text[spans[1].range.clone()], "$d$");
        assert_eq!(spans[1].kind, FormulaKind::Inline);
    }
}
