//! 翻译流程控制器
//!
//! 错误传播规则：
//! - 提取失败或文本为空时只显示提示框，不插入视图，也不发起请求
//! - 插入加载视图之后的失败替换为错误视图，重试使用提取时的文本
//! - 结果返回时加载视图已被移除，则丢弃结果

use super::host::{ViewHost, ViewId};
use super::render::{MarkdownRenderer, PulldownRenderer};
use super::view::{ToolbarAction, TranslationView, ViewEffect};
use crate::parsers::html::SelectionRange;
use crate::translation::core::{MessageBus, SelectionTranslator};
use crate::translation::error::{ErrorPresentation, TranslationError};
use crate::translation::pipeline::SelectionCapture;

/// 一次翻译的去向
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// 结果视图已插入
    Rendered(ViewId),
    /// 错误视图已插入
    Failed(ViewId),
    /// 以提示框结束，没有留下视图
    Tooltip(TranslationError),
    /// 视图在等待期间被移除，结果被丢弃
    Dropped,
}

/// 翻译流程控制器
pub struct PresentationController<B, H, M = PulldownRenderer> {
    translator: SelectionTranslator<B>,
    host: H,
    renderer: M,
}

impl<B: MessageBus, H: ViewHost> PresentationController<B, H> {
    pub fn new(translator: SelectionTranslator<B>, host: H) -> Self {
        Self::with_renderer(translator, host, PulldownRenderer::default())
    }
}

impl<B: MessageBus, H: ViewHost, M: MarkdownRenderer> PresentationController<B, H, M> {
    pub fn with_renderer(translator: SelectionTranslator<B>, host: H, renderer: M) -> Self {
        Self {
            translator,
            host,
            renderer,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn translator(&self) -> &SelectionTranslator<B> {
        &self.translator
    }

    /// 翻译当前选区
    pub async fn run<R: SelectionRange>(&self, range: Option<R>) -> RunOutcome {
        let SelectionCapture { text, range } = match self.translator.capture(range) {
            Ok(capture) => capture,
            Err(e) => return self.tooltip(e),
        };

        if text.trim().is_empty() {
            return self.tooltip(TranslationError::EmptyInput);
        }

        let id = match self.host.insert_after(&range, &TranslationView::loading()) {
            Ok(id) => id,
            Err(e) => return self.tooltip(e),
        };
        drop(range);

        self.finish(id, text).await
    }

    /// 以错误视图中保存的文本重新翻译
    pub async fn retry(&self, id: ViewId) -> RunOutcome {
        let Some(mut view) = self.host.view(id) else {
            return RunOutcome::Dropped;
        };

        match view.apply(ToolbarAction::Retry) {
            ViewEffect::Retry(text) => {
                tracing::info!("重试视图 #{}", id);
                if !self.host.replace(id, &TranslationView::loading()) {
                    return RunOutcome::Dropped;
                }
                self.finish(id, text).await
            }
            _ => RunOutcome::Failed(id),
        }
    }

    /// 处理同步的工具栏按钮，重试需调用 [`Self::retry`]
    pub fn press(&self, id: ViewId, action: ToolbarAction) -> Option<ViewEffect> {
        let mut view = self.host.view(id)?;
        let effect = view.apply(action);

        match &effect {
            ViewEffect::Redraw => {
                self.host.replace(id, &view);
            }
            ViewEffect::Remove => {
                self.host.remove(id);
            }
            _ => {}
        }
        Some(effect)
    }

    async fn finish(&self, id: ViewId, text: String) -> RunOutcome {
        let result = self.translator.translate_text(&text).await;

        if !self.host.is_attached(id) {
            tracing::debug!("视图 #{} 已被移除，丢弃翻译结果", id);
            return RunOutcome::Dropped;
        }

        match result {
            Ok(outcome) => {
                let html = self.renderer.render(&outcome.text);
                self.host.replace(id, &TranslationView::result(html, outcome.text));
                RunOutcome::Rendered(id)
            }
            Err(e) if e.presentation() == ErrorPresentation::Tooltip => {
                self.host.remove(id);
                self.tooltip(e)
            }
            Err(e) => {
                tracing::error!("翻译失败: {}", e);
                self.host.replace(id, &TranslationView::error(&e, text));
                RunOutcome::Failed(id)
            }
        }
    }

    fn tooltip(&self, error: TranslationError) -> RunOutcome {
        self.host.show_tooltip(&error.user_message());
        RunOutcome::Tooltip(error)
    }
}
