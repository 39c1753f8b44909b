//! 翻译请求适配器
//!
//! 把受保护文本包装成请求信封，经 [`MessageBus`] 发往后台，
//! 在客户端截止时间内等待应答，并把应答映射为类型化的结果。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::bus::MessageBus;
use super::messages::{BackgroundResponse, ExtensionMessage, LangPair, RpcRequest, RpcResponse};
use crate::translation::config::constants;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 一次翻译的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    /// 未经修复的译文
    pub text: String,
    /// 服务检测到的源语言
    pub detected_source_lang: Option<String>,
}

/// 适配器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub timeout: Duration,
    pub splitting: Option<String>,
    pub request_alternatives: Option<u32>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            splitting: Some(constants::DEFAULT_SPLITTING.to_string()),
            request_alternatives: None,
        }
    }
}

/// 请求关联 id 生成器
///
/// 以启动时的毫秒时间戳为起点单调递增，超时被丢弃的请求不会让后续请求复用它的 id。
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        let seed = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Self::starting_at(seed)
    }

    pub fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 翻译请求适配器
pub struct TranslationAdapter<B> {
    bus: B,
    config: AdapterConfig,
    ids: Arc<RequestIdGenerator>,
}

impl<B: MessageBus> TranslationAdapter<B> {
    pub fn new(bus: B, config: AdapterConfig) -> Self {
        Self::with_ids(bus, config, Arc::new(RequestIdGenerator::new()))
    }

    /// 与其他适配器共享 id 空间
    pub fn with_ids(bus: B, config: AdapterConfig, ids: Arc<RequestIdGenerator>) -> Self {
        Self { bus, config, ids }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// 翻译一段受保护文本
    pub async fn translate(&self, text: &str, lang: &LangPair) -> TranslationResult<TranslationOutcome> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let id = self.ids.next_id();
        let request = RpcRequest::translate(
            id,
            text,
            lang,
            self.config.splitting.clone(),
            self.config.request_alternatives,
        );

        tracing::info!(
            "发送翻译请求 id={} {} -> {} ({} 字符)",
            id,
            lang.source,
            lang.target,
            text.chars().count()
        );
        let started = Instant::now();

        // 超时后发送方的 future 被丢弃，迟到的应答不会再被读取
        let sent = self.bus.send(ExtensionMessage::Translate(request));
        let response = match tokio::time::timeout(self.config.timeout, sent).await {
            Ok(response) => response?,
            Err(_) => {
                tracing::warn!("翻译请求 id={} 超时（{:?}）", id, self.config.timeout);
                return Err(TranslationError::Timeout(self.config.timeout));
            }
        };

        let outcome = read_response(id, response)?;
        tracing::debug!("翻译请求 id={} 完成，耗时 {:?}", id, started.elapsed());
        Ok(outcome)
    }
}

/// 把后台应答映射为翻译结果
fn read_response(id: u64, response: BackgroundResponse) -> TranslationResult<TranslationOutcome> {
    if !response.success {
        let message = response
            .error_text()
            .unwrap_or_else(|| "翻译服务未返回错误说明".to_string());
        return Err(TranslationError::TranslationService(message));
    }

    let data = response
        .data
        .ok_or_else(|| helpers::malformed("应答缺少 data 字段"))?;
    let rpc: RpcResponse = serde_json::from_value(data)
        .map_err(|e| helpers::malformed(format!("应答结构不符合约定: {}", e)))?;

    if rpc.id != id {
        return Err(helpers::malformed(format!(
            "应答 id {} 与请求 id {} 不一致",
            rpc.id, id
        )));
    }

    let first = rpc
        .result
        .texts
        .into_iter()
        .next()
        .ok_or_else(|| helpers::malformed("应答中没有译文"))?;

    Ok(TranslationOutcome {
        text: first.text,
        detected_source_lang: first.detected_source_language,
    })
}
