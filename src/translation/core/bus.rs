//! 消息边界
//!
//! 内容侧通过 [`MessageBus`] 把翻译请求交给后台。后台由 [`BackgroundHandler`]
//! 实现：解析请求、调用上游服务、包装成统一的应答。[`LocalBus`] 在同一进程内
//! 把两端直接连起来。

use std::sync::Arc;

use async_trait::async_trait;

use super::messages::{BackgroundResponse, ExtensionMessage, RpcRequest, RpcResponse};
use super::provider::TranslationProvider;
use crate::translation::error::{helpers, TranslationResult};

/// 跨上下文的消息通道
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// 发送消息并等待应答
    async fn send(&self, message: ExtensionMessage) -> TranslationResult<BackgroundResponse>;
}

#[async_trait]
impl<B: MessageBus + ?Sized> MessageBus for Arc<B> {
    async fn send(&self, message: ExtensionMessage) -> TranslationResult<BackgroundResponse> {
        (**self).send(message).await
    }
}

/// 后台消息处理器
#[derive(Debug)]
pub struct BackgroundHandler<P> {
    provider: P,
}

impl<P: TranslationProvider> BackgroundHandler<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// 处理一条消息；不归后台处理的消息返回 `None`
    pub async fn handle(&self, message: ExtensionMessage) -> Option<BackgroundResponse> {
        match message {
            ExtensionMessage::Translate(request) => Some(self.handle_translate(request).await),
            ExtensionMessage::ToggleTranslator => None,
        }
    }

    async fn handle_translate(&self, request: RpcRequest) -> BackgroundResponse {
        let Some(text) = request.first_text() else {
            return BackgroundResponse::failed("请求中没有待翻译文本");
        };

        let lang = request.lang_pair();
        match self.provider.translate(text, &lang).await {
            Ok(translation) => {
                tracing::debug!("{} 完成请求 id={}", self.provider.name(), request.id);
                let response = RpcResponse::single(
                    request.id,
                    translation.text,
                    translation.detected_source_language,
                    Some(request.params.lang.clone()),
                );
                BackgroundResponse::ok(&response)
            }
            Err(e) => {
                tracing::error!("{} 翻译失败 id={}: {}", self.provider.name(), request.id, e);
                BackgroundResponse::failed(e.detail())
            }
        }
    }
}

/// 进程内消息通道
#[derive(Debug)]
pub struct LocalBus<P> {
    handler: Arc<BackgroundHandler<P>>,
}

impl<P> Clone for LocalBus<P> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<P: TranslationProvider> LocalBus<P> {
    pub fn new(provider: P) -> Self {
        Self {
            handler: Arc::new(BackgroundHandler::new(provider)),
        }
    }

    pub fn handler(&self) -> &BackgroundHandler<P> {
        &self.handler
    }
}

#[async_trait]
impl<P: TranslationProvider> MessageBus for LocalBus<P> {
    async fn send(&self, message: ExtensionMessage) -> TranslationResult<BackgroundResponse> {
        self.handler
            .handle(message)
            .await
            .ok_or_else(|| helpers::service_error("后台没有响应该消息"))
    }
}
