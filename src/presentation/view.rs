//! 翻译结果视图
//!
//! 视图有三种状态：加载中、结果、错误。结果视图带工具栏
//! （复制、原文切换、折叠、关闭），错误视图带重试按钮，重试使用提取时的文本。

use crate::parsers::html::escape_html;
use crate::translation::error::TranslationError;

/// 视图状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Result {
        /// 渲染后的 HTML
        html: String,
        /// 修复后的 Markdown 源码
        raw: String,
    },
    Error {
        message: String,
        /// 提取时的文本，重试从这里开始
        retry_text: String,
        retryable: bool,
    },
}

/// 工具栏按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Copy,
    ToggleRaw,
    Collapse,
    Close,
    Retry,
}

impl ToolbarAction {
    pub fn name(self) -> &'static str {
        match self {
            ToolbarAction::Copy => "copy",
            ToolbarAction::ToggleRaw => "toggle-raw",
            ToolbarAction::Collapse => "collapse",
            ToolbarAction::Close => "close",
            ToolbarAction::Retry => "retry",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ToolbarAction::Copy => "复制",
            ToolbarAction::ToggleRaw => "原文",
            ToolbarAction::Collapse => "折叠",
            ToolbarAction::Close => "关闭",
            ToolbarAction::Retry => "重试",
        }
    }
}

/// 按钮触发后宿主需要执行的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    /// 写入剪贴板
    Copy(String),
    /// 视图已更新，需要重绘
    Redraw,
    /// 移除视图
    Remove,
    /// 以给定文本重新翻译
    Retry(String),
    /// 当前状态下按钮无效
    Ignored,
}

/// 翻译结果视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationView {
    state: ViewState,
    show_raw: bool,
    collapsed: bool,
}

impl TranslationView {
    pub fn loading() -> Self {
        Self::with_state(ViewState::Loading)
    }

    pub fn result(html: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::with_state(ViewState::Result {
            html: html.into(),
            raw: raw.into(),
        })
    }

    pub fn error(error: &TranslationError, retry_text: impl Into<String>) -> Self {
        Self::with_state(ViewState::Error {
            message: error.user_message(),
            retry_text: retry_text.into(),
            retryable: error.is_retryable(),
        })
    }

    fn with_state(state: ViewState) -> Self {
        Self {
            state,
            show_raw: false,
            collapsed: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading)
    }

    pub fn show_raw(&self) -> bool {
        self.show_raw
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// 处理工具栏按钮
    pub fn apply(&mut self, action: ToolbarAction) -> ViewEffect {
        match (&self.state, action) {
            (_, ToolbarAction::Close) => ViewEffect::Remove,
            (ViewState::Result { raw, .. }, ToolbarAction::Copy) => ViewEffect::Copy(raw.clone()),
            (ViewState::Result { .. }, ToolbarAction::ToggleRaw) => {
                self.show_raw = !self.show_raw;
                ViewEffect::Redraw
            }
            (ViewState::Result { .. }, ToolbarAction::Collapse) => {
                self.collapsed = !self.collapsed;
                ViewEffect::Redraw
            }
            (ViewState::Error { retry_text, .. }, ToolbarAction::Retry) => {
                ViewEffect::Retry(retry_text.clone())
            }
            _ => ViewEffect::Ignored,
        }
    }

    /// 生成视图 HTML
    pub fn to_html(&self) -> String {
        match &self.state {
            ViewState::Loading => concat!(
                r#"<div class="mdtex-translation mdtex-loading">"#,
                r#"<span class="mdtex-spinner"></span>翻译中...</div>"#,
            )
            .to_string(),
            ViewState::Result { html, raw } => {
                let toolbar = self.toolbar(&[
                    ToolbarAction::Copy,
                    ToolbarAction::ToggleRaw,
                    ToolbarAction::Collapse,
                    ToolbarAction::Close,
                ]);
                let body = if self.show_raw {
                    format!(r#"<pre class="mdtex-raw">{}</pre>"#, escape_html(raw))
                } else {
                    format!(r#"<div class="mdtex-rendered">{}</div>"#, html)
                };
                let class = if self.collapsed {
                    "mdtex-translation mdtex-collapsed"
                } else {
                    "mdtex-translation"
                };
                format!(r#"<div class="{}">{}{}</div>"#, class, toolbar, body)
            }
            ViewState::Error { message, retryable, .. } => {
                let mut actions = Vec::with_capacity(2);
                if *retryable {
                    actions.push(ToolbarAction::Retry);
                }
                actions.push(ToolbarAction::Close);
                format!(
                    r#"<div class="mdtex-translation mdtex-error"><span class="mdtex-message">{}</span>{}</div>"#,
                    escape_html(message),
                    self.toolbar(&actions)
                )
            }
        }
    }

    fn toolbar(&self, actions: &[ToolbarAction]) -> String {
        let buttons: String = actions
            .iter()
            .map(|action| {
                let label = match action {
                    ToolbarAction::ToggleRaw if self.show_raw => "渲染",
                    ToolbarAction::Collapse if self.collapsed => "展开",
                    other => other.label(),
                };
                format!(r#"<button data-action="{}">{}</button>"#, action.name(), label)
            })
            .collect();
        format!(r#"<div class="mdtex-toolbar">{}</div>"#, buttons)
    }
}
