//! 翻译系统核心模块
//!
//! 负责内容侧与后台之间的往返：
//!
//! - **消息** (`messages.rs`): 请求与应答信封
//! - **上游服务** (`provider.rs`): 真正调用翻译接口的后台实现
//! - **消息通道** (`bus.rs`): 跨上下文边界，附带进程内实现
//! - **适配器** (`adapter.rs`): 截止时间、id 关联与应答映射
//! - **服务** (`service.rs`): 串起提取、保护、翻译、还原和修复
//!
//! ## 模块依赖关系
//!
//! ```text
//! SelectionTranslator (service.rs)
//!     ├── Extractor / Protector / RepairEngine (pipeline)
//!     └── TranslationAdapter (adapter.rs)
//!             └── MessageBus (bus.rs)
//!                     └── BackgroundHandler → TranslationProvider (provider.rs)
//! ```

pub mod adapter;
pub mod bus;
pub mod messages;
pub mod provider;
pub mod service;

pub use adapter::{AdapterConfig, RequestIdGenerator, TranslationAdapter, TranslationOutcome};
pub use bus::{BackgroundHandler, LocalBus, MessageBus};
pub use messages::{
    BackgroundResponse, ExtensionMessage, LangPair, RpcLang, RpcParams, RpcRequest, RpcResponse,
    RpcResult, RpcText, RpcTranslatedText,
};
pub use provider::{DeepLProvider, ProviderTranslation, TranslationProvider};
pub use service::{SelectionTranslator, ServiceStats, ServiceStatsSnapshot};
