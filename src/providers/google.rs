//! Google Translate Provider
//!
//! Google Cloud Translation API v2，提供翻译与语言检测两种能力。
//! 检测链中 Google 优先于 Microsoft。

use super::TranslationProvider;
use crate::config::GoogleConfig;
use crate::error::TranslateError;
use crate::languages;
use crate::ProviderType;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct TranslateRequest {
    q: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    data: DetectData,
}

#[derive(Debug, Deserialize)]
struct DetectData {
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

pub struct GoogleProvider {
    config: Option<GoogleConfig>,
    client: Client,
}

impl GoogleProvider {
    pub fn new(config: Option<GoogleConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn config(&self) -> Result<&GoogleConfig, TranslateError> {
        self.config
            .as_ref()
            .ok_or_else(|| TranslateError::provider(ProviderType::Google, "未配置凭证"))
    }

    fn parse_translate_response(body: &str) -> Result<String, TranslateError> {
        let response: TranslateResponse = serde_json::from_str(body)
            .map_err(|e| TranslateError::invalid_response(ProviderType::Google, e.to_string()))?;
        response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| {
                TranslateError::invalid_response(ProviderType::Google, "translations 为空")
            })
    }

    fn parse_detect_response(body: &str) -> Result<String, TranslateError> {
        let response: DetectResponse = serde_json::from_str(body)
            .map_err(|e| TranslateError::invalid_response(ProviderType::Google, e.to_string()))?;
        response
            .data
            .detections
            .into_iter()
            .next()
            .and_then(|group| group.into_iter().next())
            .map(|d| d.language)
            .ok_or_else(|| {
                TranslateError::invalid_response(ProviderType::Google, "detections 为空")
            })
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        api_key: &str,
        payload: &T,
    ) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::Google, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::Google, e.to_string()))?;

        if !status.is_success() {
            return Err(TranslateError::provider(
                ProviderType::Google,
                format!("HTTP {status}: {body}"),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl TranslationProvider for GoogleProvider {
    fn kind(&self) -> ProviderType {
        ProviderType::Google
    }

    fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn can_detect(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError> {
        let config = self.config()?;
        let target = languages::code_for(ProviderType::Google, target_lang)
            .ok_or_else(|| TranslateError::provider(ProviderType::Google, "不支持的目标语言"))?;
        let request = TranslateRequest {
            q: text.to_string(),
            target,
            source: source_lang
                .and_then(|s| languages::code_for(ProviderType::Google, s)),
        };

        let body = self
            .post_json(&config.base_url, &config.api_key, &request)
            .await?;
        Self::parse_translate_response(&body)
    }

    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let config = self.config()?;
        let url = format!("{}/detect", config.base_url);
        let payload = serde_json::json!({ "q": text });

        let body = self.post_json(&url, &config.api_key, &payload).await?;
        Self::parse_detect_response(&body)
    }
}
