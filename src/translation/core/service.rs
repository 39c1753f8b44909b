//! 选区翻译服务
//!
//! 把提取、保护、请求、还原、修复串成一条流水线：
//!
//! ```text
//! 选区 → Extractor → Protector::protect → TranslationAdapter → Protector::restore → RepairEngine
//! ```
//!
//! 每次翻译都新建自己的 [`Protector`]，并发的多次翻译之间不共享占位符表。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::adapter::{AdapterConfig, TranslationAdapter, TranslationOutcome};
use super::bus::MessageBus;
use super::messages::LangPair;
use crate::parsers::html::SelectionRange;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    is_formula_only, is_markdown, repair_markdown, DetectorSet, Extractor, PlaceholderStyle,
    Protector, RepairEngine, SelectionCapture,
};

/// 选区翻译服务
pub struct SelectionTranslator<B> {
    extractor: Extractor,
    adapter: TranslationAdapter<B>,
    repair: RepairEngine,
    lang: LangPair,
    stats: ServiceStats,
}

impl<B: MessageBus> SelectionTranslator<B> {
    pub fn new(extractor: Extractor, adapter: TranslationAdapter<B>, repair: RepairEngine, lang: LangPair) -> Self {
        Self {
            extractor,
            adapter,
            repair,
            lang,
            stats: ServiceStats::default(),
        }
    }

    /// 按配置组装
    pub fn from_config(bus: B, config: &TranslationConfig) -> Self {
        let adapter = TranslationAdapter::new(
            bus,
            AdapterConfig {
                timeout: config.timeout(),
                splitting: config.splitting.clone(),
                request_alternatives: config.request_alternatives,
            },
        );

        Self::new(
            Extractor::new(config.extractor.clone()),
            adapter,
            RepairEngine::new(config.repair.clone()),
            config.lang_pair(),
        )
    }

    pub fn lang(&self) -> &LangPair {
        &self.lang
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 提取选区文本，失败时不会触达网络
    pub fn capture<R: SelectionRange>(&self, range: Option<R>) -> TranslationResult<SelectionCapture<R>> {
        match self.extractor.extract(range) {
            Ok(capture) => {
                self.stats.inc_selections_captured();
                Ok(capture)
            }
            Err(e) => {
                self.stats.inc_errors();
                Err(e)
            }
        }
    }

    /// 翻译已提取的文本并修复格式
    pub async fn translate_text(&self, text: &str) -> TranslationResult<TranslationOutcome> {
        let started = Instant::now();
        let result = self.run(text).await;
        self.stats.add_processing_time(started.elapsed());

        match result {
            Ok(outcome) => {
                self.stats.inc_translations_completed();
                Ok(outcome)
            }
            Err(e) => {
                self.stats.inc_errors();
                helpers::log_error(e)
            }
        }
    }

    async fn run(&self, text: &str) -> TranslationResult<TranslationOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TranslationError::EmptyInput);
        }
        self.stats.add_chars_processed(trimmed.chars().count());

        if is_formula_only(trimmed) {
            tracing::debug!("选区只包含公式，跳过翻译");
            self.stats.inc_formula_shortcuts();
            return Ok(TranslationOutcome {
                text: trimmed.to_string(),
                detected_source_lang: None,
            });
        }

        let prepared = if is_markdown(trimmed) {
            repair_markdown(trimmed)
        } else {
            trimmed.to_string()
        };

        let mut protector = Protector::new(PlaceholderStyle::Block);
        let protected = protector.protect(&prepared, &DetectorSet::translation());
        self.stats.add_spans_protected(protector.len());
        tracing::debug!("已保护 {} 个片段", protector.len());

        let outcome = self.adapter.translate(&protected, &self.lang).await?;
        let restored = protector.restore(&outcome.text);
        protector.clear();

        Ok(TranslationOutcome {
            text: self.repair.repair(&restored),
            detected_source_lang: outcome.detected_source_lang,
        })
    }
}

/// 服务统计信息
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 成功提取的选区数量
    pub selections_captured: AtomicUsize,
    /// 完成的翻译数量
    pub translations_completed: AtomicUsize,
    /// 只含公式而未请求翻译的次数
    pub formula_shortcuts: AtomicUsize,
    /// 累计保护的片段数量
    pub spans_protected: AtomicUsize,
    /// 总处理时间（微秒）
    pub processing_time: AtomicU64,
    pub total_chars_processed: AtomicUsize,
    pub errors_encountered: AtomicUsize,
}

impl ServiceStats {
    pub fn inc_selections_captured(&self) {
        self.selections_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_translations_completed(&self) {
        self.translations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_formula_shortcuts(&self) {
        self.formula_shortcuts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_spans_protected(&self, count: usize) {
        self.spans_protected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.processing_time.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn add_chars_processed(&self, count: usize) {
        self.total_chars_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_errors(&self) {
        self.errors_encountered.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取统计数据快照
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            selections_captured: self.selections_captured.load(Ordering::Relaxed),
            translations_completed: self.translations_completed.load(Ordering::Relaxed),
            formula_shortcuts: self.formula_shortcuts.load(Ordering::Relaxed),
            spans_protected: self.spans_protected.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
            total_chars_processed: self.total_chars_processed.load(Ordering::Relaxed),
            errors_encountered: self.errors_encountered.load(Ordering::Relaxed),
        }
    }
}

/// 统计数据的不可变快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub selections_captured: usize,
    pub translations_completed: usize,
    pub formula_shortcuts: usize,
    pub spans_protected: usize,
    pub processing_time: Duration,
    pub total_chars_processed: usize,
    pub errors_encountered: usize,
}
