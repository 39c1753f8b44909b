//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `fragment`: 结构化片段树接口及 rcdom 实现
//! - `serializer`: 序列化功能
//! - `utils`: 基础工具函数和常量

pub mod dom;
pub mod fragment;
pub mod serializer;
pub mod utils;

// 重新导出主要的公共 API
pub use dom::{fragment_to_dom, get_node_attr, get_node_name, text_content};
pub use fragment::{FragmentTree, HtmlFragment, HtmlSelection, SelectionRange};
pub use serializer::serialize_children;
pub use utils::{escape_html, is_blank, NOISE_CLASSES, NOISE_ELEMENTS, WHITESPACES};
