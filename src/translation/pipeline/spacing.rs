//! 中英文混排的空白规则

/// 在汉字与相邻的英文字母或数字之间补一个空格
pub fn add_cjk_latin_spacing(text: &str) -> String {
    let text = cached_regex!(r"([\x{4e00}-\x{9fa5}])([A-Za-z0-9])").replace_all(text, "$1 $2");
    let text = cached_regex!(r"([A-Za-z0-9])([\x{4e00}-\x{9fa5}])").replace_all(&text, "$1 $2");
    text.into_owned()
}

/// 合并空白并去掉首尾空白
///
/// `preserve_newlines` 为真时只合并行内空白，段落换行保留（最多一个空行）。
pub fn collapse_whitespace(text: &str, preserve_newlines: bool) -> String {
    if !preserve_newlines {
        return cached_regex!(r"\s+").replace_all(text, " ").trim().to_string();
    }

    let text = cached_regex!(r"[^\S\n]+").replace_all(text, " ");
    let text = cached_regex!(r" ?\n ?").replace_all(&text, "\n");
    let text = cached_regex!(r"\n{3,}").replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// 去掉中文闭合标点前、中文开启标点后的空白
pub fn tidy_cjk_punctuation(text: &str) -> String {
    let text = cached_regex!(r"\s+([，。、；：？！）】」』}])").replace_all(text, "$1");
    let text = cached_regex!(r"([（【「『{])\s+").replace_all(&text, "$1");
    text.into_owned()
}
