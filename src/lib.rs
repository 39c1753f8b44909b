//! # MdTeX Translator Library
//!
//! 划词翻译工具库：把网页上选中的内容连同 Markdown 结构和 LaTeX 公式一起送去机器翻译，
//! 并把译文修复成可以直接渲染的 Markdown。
//!
//! ## 模块组织
//!
//! - `utils` - 正则缓存宏和 CJK 字符分类
//! - `parsers` - HTML 片段树和各公式渲染约定的源码恢复
//! - `translation` - 提取、保护、翻译、还原、修复流水线及消息边界
//! - `presentation` - 结果视图、渲染和浮动按钮
//! - `core` - 命令行使用的输入输出辅助
//! - `env` - 环境变量

#[macro_use]
pub mod utils;

pub mod core;
pub mod env;
pub mod parsers;
pub mod presentation;
pub mod translation;

// Re-export commonly used items for convenience
pub use core::{decode_input, extract_input, read_input, render_result_view, InputKind};
pub use parsers::html::{HtmlFragment, HtmlSelection, SelectionRange};
pub use parsers::math::MathConvention;
pub use translation::{
    ConfigManager, SelectionTranslator, TranslationConfig, TranslationError, TranslationOutcome,
    TranslationResult,
};
