//! 数学公式渲染产物的源码恢复
//!
//! 网页上的公式通常已经被渲染成复杂的节点结构。这里按渲染约定
//! 找回作者写下的 TeX 源码，并用一个文本节点替换整段渲染结果。
//!
//! - `mathjax`: 预览节点 + 渲染帧 + `script[type="math/tex"]`
//! - `katex`: `.katex` 容器内 `.katex-mathml` 的 TeX 注解
//! - `mathml`: `<math>` 元素的 TeX 注解、`alttext` 或文本内容

pub mod katex;
pub mod mathjax;
pub mod mathml;

use serde::{Deserialize, Serialize};

use crate::parsers::html::FragmentTree;
use crate::translation::pipeline::detectors::FormulaKind;

/// TeX 注解的 `encoding` 属性值
pub const TEX_ENCODING: &str = "application/x-tex";

/// 读屏文本的特征串，出现时说明文本不是真正的公式源码
pub const LOSSY_FORMULA_MARKERS: &[&str] = &["subscript", "POSTSUBSCRIPT", "POSTSUPERSCRIPT"];

/// 残留文本节点的特征串
pub const LOSSY_RESIDUE_MARKERS: &[&str] = &[
    "subscript",
    "POSTSUBSCRIPT",
    "POSTSUPERSCRIPT",
    "start_",
    "end_",
    "bold_",
    "italic_",
    "blackboard_",
];

/// 支持的渲染约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MathConvention {
    MathJax,
    KaTeX,
    MathMl,
}

impl MathConvention {
    /// 全部约定，按处理顺序排列
    ///
    /// MathJax 和 KaTeX 的渲染结果内部都嵌有 `<math>`，必须先于 MathML 处理，
    /// 否则内层 `<math>` 被单独替换后外层容器就找不到注解了。
    pub const ALL: [MathConvention; 3] =
        [MathConvention::MathJax, MathConvention::KaTeX, MathConvention::MathMl];

    pub fn name(self) -> &'static str {
        match self {
            MathConvention::MathJax => "MathJax",
            MathConvention::KaTeX => "KaTeX",
            MathConvention::MathMl => "MathML",
        }
    }

    /// 在片段中恢复该约定的全部公式，返回替换的公式数
    pub fn recover<T: FragmentTree>(self, tree: &T) -> usize {
        let count = match self {
            MathConvention::MathJax => mathjax::recover(tree),
            MathConvention::KaTeX => katex::recover(tree),
            MathConvention::MathMl => mathml::recover(tree),
        };
        tracing::debug!("{} 公式恢复 {} 个", self.name(), count);
        count
    }
}

/// 公式文本是否可信（不含读屏特征串）
pub fn is_valid_formula(text: &str) -> bool {
    !LOSSY_FORMULA_MARKERS.iter().any(|marker| text.contains(marker))
}

/// 文本节点是否为读屏残留
pub fn is_lossy_residue(text: &str) -> bool {
    LOSSY_RESIDUE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// 残留文本中可以保留的 `\command{…}` 片段
pub fn salvage_command(text: &str) -> Option<&str> {
    cached_regex!(r"\\[a-zA-Z]+\{.*?\}")
        .find(text)
        .map(|m| m.as_str())
}

/// 按内容选择定界符包裹公式
pub fn wrap_formula(source: &str) -> String {
    let source = source.trim();
    FormulaKind::classify(source).wrap(source)
}

/// 作用域内第一个 TeX 注解的文本
pub fn tex_annotation<T: FragmentTree>(tree: &T, scope: &T::Node) -> Option<String> {
    tree.find_first(scope, &|n| {
        tree.is_element(n, "annotation") && tree.attr(n, "encoding").as_deref() == Some(TEX_ENCODING)
    })
    .map(|annotation| tree.read_text(&annotation))
    .filter(|text| !text.trim().is_empty())
}
