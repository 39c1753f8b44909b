//! 结果呈现
//!
//! 把修复后的译文渲染成可交互的结果视图，并管理浮动翻译按钮。

pub mod controller;
pub mod floating;
pub mod host;
pub mod render;
pub mod storage;
pub mod view;

pub use controller::{PresentationController, RunOutcome};
pub use floating::{clamp_position, ControlEvent, ExtensionController, FloatingControl, PointerRelease, Position, Size};
pub use host::{MemoryHost, ViewHost, ViewId};
pub use render::{DelimiterMathTypesetter, MarkdownRenderer, MathTypesetter, PulldownRenderer};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use view::{ToolbarAction, TranslationView, ViewEffect, ViewState};
