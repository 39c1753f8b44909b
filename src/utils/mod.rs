//! # 工具模块
//!
//! 这个模块包含文本处理各阶段共用的工具：
//!
//! - `cached_regex!` 宏：内置正则表达式只编译一次
//! - CJK 字符与标点分类

/// 取得一个只编译一次的内置正则表达式
///
/// 模式是编译期常量，编译失败属于程序缺陷。
macro_rules! cached_regex {
    ($pattern:expr) => {{
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($pattern).expect("内置正则表达式无效"))
    }};
}

/// 中文闭合标点（含全角右括号和右花括号）
pub const CJK_CLOSING_PUNCTUATION: &[char] =
    &['，', '。', '、', '；', '：', '？', '！', '）', '】', '」', '』', '}'];

/// 中文开启标点
pub const CJK_OPENING_PUNCTUATION: &[char] = &['（', '【', '「', '『', '{'];

/// 英文闭合标点
pub const ASCII_CLOSING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '?', '!', ')', ']', '}'];

/// 英文开启标点
pub const ASCII_OPENING_PUNCTUATION: &[char] = &['(', '[', '{'];

/// 是否为常用汉字（U+4E00..=U+9FA5）
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Markdown 强调标记
pub fn is_emphasis_marker(c: char) -> bool {
    c == '*' || c == '_'
}

/// 公式之后不应留空格的标点
pub fn is_closing_punctuation(c: char) -> bool {
    CJK_CLOSING_PUNCTUATION.contains(&c) || ASCII_CLOSING_PUNCTUATION.contains(&c)
}

/// 公式之前不应留空格的标点
pub fn is_opening_punctuation(c: char) -> bool {
    CJK_OPENING_PUNCTUATION.contains(&c) || ASCII_OPENING_PUNCTUATION.contains(&c)
}
