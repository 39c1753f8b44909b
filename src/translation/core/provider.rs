//! 上游翻译服务
//!
//! 后台收到翻译消息后通过 [`TranslationProvider`] 调用真正的翻译接口。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::messages::LangPair;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationResult};

/// 上游服务返回的单条译文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTranslation {
    pub text: String,
    pub detected_source_language: Option<String>,
}

/// 翻译服务提供方
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(&self, text: &str, lang: &LangPair) -> TranslationResult<ProviderTranslation>;
}

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: Vec<&'a str>,
    source_lang: Option<&'a str>,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

/// DeepL 接口
#[derive(Debug, Clone)]
pub struct DeepLProvider {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl DeepLProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> TranslationResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| helpers::config_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self::with_client(client, endpoint, api_key))
    }

    /// 使用已有的客户端
    pub fn with_client(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// 从配置创建，未设置密钥时报配置错误
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| helpers::config_error("请先设置 DeepL API 密钥（MDTEX_API_KEY）"))?;

        Self::new(config.api_url.clone(), api_key, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &str {
        "DeepL"
    }

    async fn translate(&self, text: &str, lang: &LangPair) -> TranslationResult<ProviderTranslation> {
        let body = DeepLRequest {
            text: vec![text],
            source_lang: (!lang.is_auto()).then_some(lang.source.as_str()),
            target_lang: &lang.target,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("DeepL 接口返回错误 ({}): {}", status, error_text);
            return Err(helpers::service_error(format!("API request failed: {}", error_text)));
        }

        let parsed: DeepLResponse = response.json().await?;
        let first = parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| helpers::malformed("DeepL 响应中没有译文"))?;

        Ok(ProviderTranslation {
            text: first.text,
            detected_source_language: first.detected_source_language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::TranslationError;

    #[test]
    fn test_request_body_maps_auto_to_null() {
        let body = DeepLRequest {
            text: vec!["hi"],
            source_lang: (!LangPair::auto("ZH").is_auto()).then_some("auto"),
            target_lang: "ZH",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"text":["hi"],"source_lang":null,"target_lang":"ZH"}"#
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = TranslationConfig::default();
        let err = DeepLProvider::from_config(&config).unwrap_err();
        assert!(matches!(err, TranslationError::Config(_)));
    }
}
