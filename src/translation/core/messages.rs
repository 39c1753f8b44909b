//! 内容脚本与后台之间的消息格式
//!
//! 请求沿用 JSON-RPC 风格的信封（`LMT_handle_texts`），
//! 后台以 `{success, data | error}` 应答。

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const TRANSLATE_METHOD: &str = "LMT_handle_texts";

/// 源语言为自动检测
pub const AUTO_LANG: &str = "auto";

/// 一次翻译的语言对
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LangPair {
    pub source: String,
    pub target: String,
}

impl LangPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// 自动检测源语言
    pub fn auto(target: impl Into<String>) -> Self {
        Self::new(AUTO_LANG, target)
    }

    pub fn is_auto(&self) -> bool {
        self.source.eq_ignore_ascii_case(AUTO_LANG)
    }
}

/// 发往后台的消息
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ExtensionMessage {
    /// 翻译请求
    Translate(RpcRequest),
    /// 切换浮动按钮（扩展图标被点击）
    ToggleTranslator,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: u64,
    pub params: RpcParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcParams {
    pub texts: Vec<RpcText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splitting: Option<String>,
    pub lang: RpcLang,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_alternatives: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcLang {
    pub source_lang_user_selected: String,
    pub target_lang: String,
}

impl RpcRequest {
    /// 构造单段文本的翻译请求
    pub fn translate(
        id: u64,
        text: impl Into<String>,
        lang: &LangPair,
        splitting: Option<String>,
        request_alternatives: Option<u32>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: TRANSLATE_METHOD.to_string(),
            id,
            params: RpcParams {
                texts: vec![RpcText {
                    text: text.into(),
                    request_alternatives,
                }],
                splitting,
                lang: RpcLang {
                    source_lang_user_selected: lang.source.clone(),
                    target_lang: lang.target.clone(),
                },
            },
        }
    }

    /// 请求中的第一段文本
    pub fn first_text(&self) -> Option<&str> {
        self.params.texts.first().map(|t| t.text.as_str())
    }

    pub fn lang_pair(&self) -> LangPair {
        LangPair::new(
            self.params.lang.source_lang_user_selected.clone(),
            self.params.lang.target_lang.clone(),
        )
    }
}

/// 后台应答
///
/// `data` 与 `error` 保持为原始 JSON，由适配器按约定结构解析，
/// 以便区分服务失败和格式错误。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackgroundResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl BackgroundResponse {
    pub fn ok(result: &RpcResponse) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(result).ok(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(Value::String(message.into())),
        }
    }

    /// 错误文本，兼容字符串和 `{message}` 两种形式
    pub fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::String(message) => Some(message.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(Value::Object(map.clone()).to_string())),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    pub result: RpcResult,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcResult {
    pub texts: Vec<RpcTranslatedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<RpcLang>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcTranslatedText {
    pub text: String,
    #[serde(default)]
    pub detected_source_language: Option<String>,
}

impl RpcResponse {
    pub fn single(id: u64, text: impl Into<String>, detected: Option<String>, lang: Option<RpcLang>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: RpcResult {
                texts: vec![RpcTranslatedText {
                    text: text.into(),
                    detected_source_language: detected,
                }],
                lang,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translate_message_shape() {
        let request = RpcRequest::translate(
            7,
            "Hello {{BLOCK_0}}",
            &LangPair::auto("ZH"),
            Some("newlines".to_string()),
            Some(1),
        );
        let message = serde_json::to_value(ExtensionMessage::Translate(request)).unwrap();

        assert_eq!(
            message,
            json!({
                "action": "translate",
                "data": {
                    "jsonrpc": "2.0",
                    "method": "LMT_handle_texts",
                    "id": 7,
                    "params": {
                        "texts": [{"text": "Hello {{BLOCK_0}}", "requestAlternatives": 1}],
                        "splitting": "newlines",
                        "lang": {"source_lang_user_selected": "auto", "target_lang": "ZH"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_toggle_message_shape() {
        let message: ExtensionMessage =
            serde_json::from_value(json!({"action": "toggleTranslator"})).unwrap();
        assert_eq!(message, ExtensionMessage::ToggleTranslator);
    }

    #[test]
    fn test_error_text_forms() {
        let plain: BackgroundResponse =
            serde_json::from_value(json!({"success": false, "error": "quota"})).unwrap();
        assert_eq!(plain.error_text().as_deref(), Some("quota"));

        let object: BackgroundResponse =
            serde_json::from_value(json!({"success": false, "error": {"message": "denied"}})).unwrap();
        assert_eq!(object.error_text().as_deref(), Some("denied"));

        let missing: BackgroundResponse = serde_json::from_value(json!({"success": false})).unwrap();
        assert_eq!(missing.error_text(), None);
    }
}
