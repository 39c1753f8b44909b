//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **config**: 配置管理
//! - **core**: 消息、上游服务、适配器和选区翻译服务
//! - **pipeline**: 提取、保护、修复流水线
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use mdtex_translator::translation::{DeepLProvider, LocalBus, SelectionTranslator, TranslationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default();
//! let bus = LocalBus::new(DeepLProvider::from_config(&config)?);
//! let translator = SelectionTranslator::from_config(bus, &config);
//!
//! let outcome = translator.translate_text("The set $\\mathbb{R}$ is complete.").await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

/// 配置管理模块
pub mod config;

/// 核心模块：消息边界与翻译服务
pub mod core;

/// 错误处理模块
pub mod error;

/// 文本处理流水线
pub mod pipeline;

pub use config::{constants, ConfigManager, TranslationConfig};

pub use core::{
    AdapterConfig, BackgroundHandler, DeepLProvider, LangPair, LocalBus, MessageBus,
    SelectionTranslator, ServiceStats, TranslationAdapter, TranslationOutcome,
    TranslationProvider,
};

pub use error::{
    ErrorCategory, ErrorPresentation, ErrorSeverity, TranslationError, TranslationResult,
};

pub use pipeline::{
    DetectorSet, Extractor, ExtractorConfig, PlaceholderStyle, Protector, RepairEngine,
    RepairOptions, SelectionCapture,
};

/// 模块版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MODULE_NAME: &str = "translation";

/// 一次性翻译一段已提取的文本（使用 DeepL 与默认流水线）
pub async fn translate_text(text: &str, config: &TranslationConfig) -> TranslationResult<TranslationOutcome> {
    let bus = LocalBus::new(DeepLProvider::from_config(config)?);
    SelectionTranslator::from_config(bus, config).translate_text(text).await
}

/// 模块初始化
pub fn init() {
    tracing::info!("翻译模块 v{} 已加载", VERSION);
}
