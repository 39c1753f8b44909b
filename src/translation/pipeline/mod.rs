//! 翻译管道模块
//!
//! 提供文本处理管道：选区提取、占位符保护、译文修复

pub mod detectors;
pub mod extractor;
pub mod markdown;
pub mod protector;
pub mod repair;
pub mod spacing;

// 重新导出主要类型
pub use detectors::{find_formula_spans, Detector, DetectorSet, DetectorTier, FormulaKind, FormulaSpan, SpanKind};
pub use extractor::{Extractor, ExtractorConfig, MarkdownCapabilities, SelectionCapture};
pub use markdown::{is_formula_only, is_markdown, repair_markdown};
pub use protector::{PlaceholderStyle, ProtectedSpan, Protector};
pub use repair::{RepairEngine, RepairOptions};
