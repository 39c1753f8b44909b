//! # 解析器模块
//!
//! - `html` - 选区片段的 DOM 操作与序列化
//! - `math` - MathJax、KaTeX、MathML 渲染结果的公式源码恢复

pub mod html;
pub mod math;

pub use html::{FragmentTree, HtmlFragment, HtmlSelection, SelectionRange};
pub use math::MathConvention;
