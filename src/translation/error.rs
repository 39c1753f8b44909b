//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。错误分为两类：
//! 在网络请求之前发生的（选区、输入）会直接以提示框形式反馈，
//! 插入加载视图之后发生的（超时、服务、响应格式）会替换为带重试的错误视图。

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 没有选区，或选区为空
    #[error("请先选择要翻译的文本")]
    NoSelection,

    /// 选区解析后为空白文本
    #[error("翻译文本不能为空")]
    EmptyInput,

    /// 超过客户端截止时间
    #[error("翻译请求超时（{}秒）", .0.as_secs())]
    Timeout(Duration),

    /// 服务可达但返回失败
    #[error("翻译服务错误: {0}")]
    TranslationService(String),

    /// 服务响应不符合约定的结构
    #[error("翻译响应格式错误: {0}")]
    MalformedResponse(String),

    /// 选区在结果插入前失效
    #[error("无法插入翻译结果: {0}")]
    Insertion(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Storage(String),
}

/// 错误在界面上的呈现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPresentation {
    /// 短暂提示框，不插入页面
    Tooltip,
    /// 替换加载视图的错误视图，带重试按钮
    ErrorView,
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Timeout(_) => true,
            TranslationError::TranslationService(_) => true,
            TranslationError::MalformedResponse(_) => true,
            TranslationError::Network(_) => true,
            TranslationError::NoSelection => false,
            TranslationError::EmptyInput => false,
            TranslationError::Insertion(_) => false,
            TranslationError::Config(_) => false,
            TranslationError::Serialization(_) => false,
            TranslationError::Storage(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::NoSelection => ErrorSeverity::Info,
            TranslationError::EmptyInput => ErrorSeverity::Info,
            TranslationError::Timeout(_) => ErrorSeverity::Warning,
            TranslationError::Network(_) => ErrorSeverity::Warning,
            TranslationError::Insertion(_) => ErrorSeverity::Warning,
            TranslationError::TranslationService(_) => ErrorSeverity::Error,
            TranslationError::MalformedResponse(_) => ErrorSeverity::Error,
            TranslationError::Serialization(_) => ErrorSeverity::Error,
            TranslationError::Storage(_) => ErrorSeverity::Error,
            TranslationError::Config(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::NoSelection | TranslationError::EmptyInput => ErrorCategory::Input,
            TranslationError::Timeout(_) => ErrorCategory::Timeout,
            TranslationError::TranslationService(_) => ErrorCategory::Service,
            TranslationError::MalformedResponse(_) => ErrorCategory::Service,
            TranslationError::Insertion(_) => ErrorCategory::Presentation,
            TranslationError::Config(_) => ErrorCategory::Configuration,
            TranslationError::Network(_) => ErrorCategory::Network,
            TranslationError::Serialization(_) => ErrorCategory::Serialization,
            TranslationError::Storage(_) => ErrorCategory::Storage,
        }
    }

    /// 错误应以何种方式呈现给用户
    ///
    /// 选区类错误和插入错误没有稳定的锚点，只能用提示框；
    /// 其余错误发生时加载视图已经就位，用错误视图替换它。
    pub fn presentation(&self) -> ErrorPresentation {
        match self {
            TranslationError::NoSelection
            | TranslationError::EmptyInput
            | TranslationError::Insertion(_) => ErrorPresentation::Tooltip,
            _ => ErrorPresentation::ErrorView,
        }
    }

    /// 面向用户的提示文本
    pub fn user_message(&self) -> String {
        match self {
            TranslationError::Timeout(_) => "翻译请求超时，请检查网络连接后重试".to_string(),
            TranslationError::TranslationService(_) | TranslationError::MalformedResponse(_) => {
                "翻译服务出错，请稍后重试".to_string()
            }
            TranslationError::Network(_) => "网络连接失败，请检查网络后重试".to_string(),
            other => other.to_string(),
        }
    }

    /// 错误携带的原始说明，不含分类前缀
    pub fn detail(&self) -> String {
        match self {
            TranslationError::TranslationService(msg)
            | TranslationError::MalformedResponse(msg)
            | TranslationError::Insertion(msg)
            | TranslationError::Config(msg)
            | TranslationError::Network(msg)
            | TranslationError::Serialization(msg)
            | TranslationError::Storage(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::TranslationService(msg) => {
                TranslationError::TranslationService(wrap(msg))
            }
            TranslationError::MalformedResponse(msg) => {
                TranslationError::MalformedResponse(wrap(msg))
            }
            TranslationError::Insertion(msg) => TranslationError::Insertion(wrap(msg)),
            TranslationError::Config(msg) => TranslationError::Config(wrap(msg)),
            TranslationError::Network(msg) => TranslationError::Network(wrap(msg)),
            TranslationError::Serialization(msg) => TranslationError::Serialization(wrap(msg)),
            TranslationError::Storage(msg) => TranslationError::Storage(wrap(msg)),
            unit => unit,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    Timeout,
    Service,
    Presentation,
    Configuration,
    Network,
    Serialization,
    Storage,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Storage(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::Serialization(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::Network(format!("请求超时: {}", error))
        } else if error.is_decode() {
            TranslationError::MalformedResponse(format!("响应解析失败: {}", error))
        } else {
            TranslationError::Network(error.to_string())
        }
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        let category = error.category();
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息 [{:?}]: {}", category, error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告 [{:?}]: {}", category, error),
            ErrorSeverity::Error => tracing::error!("翻译错误 [{:?}]: {}", category, error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误 [{:?}]: {}", category, error),
        }

        Err(error)
    }

    /// 创建服务错误
    pub fn service_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::TranslationService(msg.to_string())
    }

    /// 创建响应格式错误
    pub fn malformed<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::MalformedResponse(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Config(msg.to_string())
    }
}
