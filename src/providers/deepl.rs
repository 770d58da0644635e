//! DeepL 翻译 Provider
//!
//! DeepL API v2 translate 端点。不提供语言检测能力。

use super::TranslationProvider;
use crate::config::DeeplConfig;
use crate::error::TranslateError;
use crate::languages;
use crate::ProviderType;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct DeeplRequest {
    text: Vec<String>,
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

pub struct DeeplProvider {
    config: Option<DeeplConfig>,
    client: Client,
}

impl DeeplProvider {
    pub fn new(config: Option<DeeplConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn parse_response(body: &str) -> Result<String, TranslateError> {
        let response: DeeplResponse = serde_json::from_str(body)
            .map_err(|e| TranslateError::invalid_response(ProviderType::DeepL, e.to_string()))?;
        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| {
                TranslateError::invalid_response(ProviderType::DeepL, "translations 为空")
            })
    }
}

#[async_trait]
impl TranslationProvider for DeeplProvider {
    fn kind(&self) -> ProviderType {
        ProviderType::DeepL
    }

    fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| TranslateError::provider(ProviderType::DeepL, "未配置凭证"))?;

        let target = languages::code_for(ProviderType::DeepL, target_lang)
            .ok_or_else(|| TranslateError::provider(ProviderType::DeepL, "不支持的目标语言"))?;
        let request = DeeplRequest {
            text: vec![text.to_string()],
            target_lang: target,
            source_lang: source_lang
                .and_then(|s| languages::code_for(ProviderType::DeepL, s)),
        };

        let response = self
            .client
            .post(&config.base_url)
            .header(
                "Authorization",
                format!("DeepL-Auth-Key {}", config.api_key),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::DeepL, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::DeepL, e.to_string()))?;

        if !status.is_success() {
            return Err(TranslateError::provider(
                ProviderType::DeepL,
                format!("HTTP {status}: {body}"),
            ));
        }
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{"translations":[{"detected_source_language":"EN","text":"こんにちは"}]}"#;
        assert_eq!(DeeplProvider::parse_response(body).unwrap(), "こんにちは");
    }

    #[test]
    fn test_parse_empty_translations() {
        let err = DeeplProvider::parse_response(r#"{"translations":[]}"#).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidResponse { .. }));
    }

    #[test]
    fn test_disabled_without_credentials() {
        let provider = DeeplProvider::new(None, Client::new());
        assert!(!provider.enabled());
    }

    #[test]
    fn test_supports_target_from_table() {
        let provider = DeeplProvider::new(None, Client::new());
        assert!(provider.supports_target("ja"));
        assert!(!provider.supports_target("th"));
        // 表外代码透传，视为支持
        assert!(provider.supports_target("eo"));
    }
}
