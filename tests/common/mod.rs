// 集成测试公共模块
//
// 提供按脚本应答的消息通道、组装好的流水线和常见渲染器输出的片段

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use mdtex_translator::translation::core::{
    AdapterConfig, BackgroundResponse, ExtensionMessage, LangPair, MessageBus, RequestIdGenerator,
    RpcRequest, RpcResponse, SelectionTranslator, TranslationAdapter,
};
use mdtex_translator::translation::{Extractor, RepairEngine, TranslationError, TranslationResult};

/// 后台对一次请求的应答方式
pub enum Reply {
    /// 成功，返回该译文
    Text(String),
    /// 服务失败
    Failure(String),
    /// 原样返回的应答
    Raw(BackgroundResponse),
    /// 等待一段时间后返回译文
    Late(Duration, String),
}

type Script = Box<dyn Fn(&RpcRequest) -> Reply + Send + Sync>;

/// 按脚本应答的消息通道，并记录收到的请求
pub struct ScriptedBus {
    script: Script,
    seen: Mutex<Vec<RpcRequest>>,
}

impl ScriptedBus {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&RpcRequest) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// 原样返回请求文本
    pub fn echo() -> Arc<Self> {
        Self::new(|request| Reply::Text(request.first_text().unwrap_or_default().to_string()))
    }

    /// 依次做字符串替换，模拟翻译
    pub fn replacing(pairs: &'static [(&'static str, &'static str)]) -> Arc<Self> {
        Self::new(move |request| {
            let mut text = request.first_text().unwrap_or_default().to_string();
            for (from, to) in pairs {
                text = text.replace(from, to);
            }
            Reply::Text(text)
        })
    }

    pub fn requests(&self) -> Vec<RpcRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_texts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|request| request.first_text().map(str::to_string))
            .collect()
    }
}

/// 成功应答，检测到的源语言固定为 EN
pub fn success(id: u64, text: impl Into<String>) -> BackgroundResponse {
    BackgroundResponse::ok(&RpcResponse::single(id, text, Some("EN".to_string()), None))
}

#[async_trait]
impl MessageBus for ScriptedBus {
    async fn send(&self, message: ExtensionMessage) -> TranslationResult<BackgroundResponse> {
        let ExtensionMessage::Translate(request) = message else {
            return Err(TranslationError::TranslationService("unexpected message".to_string()));
        };
        self.seen.lock().unwrap().push(request.clone());

        match (self.script)(&request) {
            Reply::Text(text) => Ok(success(request.id, text)),
            Reply::Failure(message) => Ok(BackgroundResponse::failed(message)),
            Reply::Raw(response) => Ok(response),
            Reply::Late(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(success(request.id, text))
            }
        }
    }
}

/// id 从 1 开始的适配器
pub fn adapter(bus: Arc<ScriptedBus>, timeout: Duration) -> TranslationAdapter<Arc<ScriptedBus>> {
    TranslationAdapter::with_ids(
        bus,
        AdapterConfig {
            timeout,
            ..AdapterConfig::default()
        },
        Arc::new(RequestIdGenerator::starting_at(1)),
    )
}

/// 默认流水线，目标语言中文
pub fn translator(bus: Arc<ScriptedBus>) -> SelectionTranslator<Arc<ScriptedBus>> {
    translator_with_timeout(bus, Duration::from_secs(30))
}

pub fn translator_with_timeout(
    bus: Arc<ScriptedBus>,
    timeout: Duration,
) -> SelectionTranslator<Arc<ScriptedBus>> {
    SelectionTranslator::new(
        Extractor::default(),
        adapter(bus, timeout),
        RepairEngine::default(),
        LangPair::auto("ZH"),
    )
}

/// KaTeX 渲染出的一个公式
pub fn katex(tex: &str) -> String {
    format!(
        concat!(
            r#"<span class="katex"><span class="katex-mathml"><math><semantics><mrow><mi>x</mi></mrow>"#,
            r#"<annotation encoding="application/x-tex">{}</annotation></semantics></math></span>"#,
            r#"<span class="katex-html" aria-hidden="true"><span class="base">x</span></span></span>"#,
        ),
        tex
    )
}

/// MathJax v2 渲染出的一个公式：预览、渲染帧和源码脚本
pub fn mathjax(id: u32, tex: &str, display: bool) -> String {
    let mode = if display { "; mode=display" } else { "" };
    format!(
        concat!(
            r#"<span class="MathJax_Preview">x</span>"#,
            r#"<span class="MathJax" id="MathJax-Element-{id}-Frame"><nobr>x</nobr></span>"#,
            r#"<script type="math/tex{mode}" id="MathJax-Element-{id}">{tex}</script>"#,
        ),
        id = id,
        mode = mode,
        tex = tex
    )
}
