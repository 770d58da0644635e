//! Microsoft Azure Translator Provider
//!
//! Translator API v3。每个请求附带区域头与随机 X-ClientTraceId，
//! 提供翻译与语言检测两种能力。

use super::TranslationProvider;
use crate::config::MicrosoftConfig;
use crate::error::TranslateError;
use crate::languages;
use crate::ProviderType;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const API_VERSION: &str = "3.0";

#[derive(Debug, Serialize)]
struct RequestItem {
    #[serde(rename = "Text")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DetectResult {
    language: String,
}

pub struct MicrosoftProvider {
    config: Option<MicrosoftConfig>,
    client: Client,
}

impl MicrosoftProvider {
    pub fn new(config: Option<MicrosoftConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn config(&self) -> Result<&MicrosoftConfig, TranslateError> {
        self.config
            .as_ref()
            .ok_or_else(|| TranslateError::provider(ProviderType::Microsoft, "未配置凭证"))
    }

    fn parse_translate_response(body: &str) -> Result<String, TranslateError> {
        let results: Vec<TranslateResult> = serde_json::from_str(body).map_err(|e| {
            TranslateError::invalid_response(ProviderType::Microsoft, e.to_string())
        })?;
        results
            .into_iter()
            .next()
            .and_then(|r| r.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or_else(|| {
                TranslateError::invalid_response(ProviderType::Microsoft, "翻译结果格式无效")
            })
    }

    fn parse_detect_response(body: &str) -> Result<String, TranslateError> {
        let results: Vec<DetectResult> = serde_json::from_str(body).map_err(|e| {
            TranslateError::invalid_response(ProviderType::Microsoft, e.to_string())
        })?;
        results
            .into_iter()
            .next()
            .map(|r| r.language)
            .ok_or_else(|| {
                TranslateError::invalid_response(ProviderType::Microsoft, "检测结果为空")
            })
    }

    async fn post(
        &self,
        path: &str,
        query: &[(&str, &str)],
        text: &str,
    ) -> Result<String, TranslateError> {
        let config = self.config()?;
        let url = format!("{}{}", config.base_url, path);
        let payload = vec![RequestItem {
            text: text.to_string(),
        }];

        let response = self
            .client
            .post(&url)
            .query(query)
            .header("Ocp-Apim-Subscription-Key", &config.api_key)
            .header("Ocp-Apim-Subscription-Region", &config.region)
            .header("X-ClientTraceId", Uuid::new_v4().to_string())
            .json(&payload)
            .send()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::Microsoft, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::provider(ProviderType::Microsoft, e.to_string()))?;

        if !status.is_success() {
            return Err(TranslateError::provider(
                ProviderType::Microsoft,
                format!("HTTP {status}: {body}"),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl TranslationProvider for MicrosoftProvider {
    fn kind(&self) -> ProviderType {
        ProviderType::Microsoft
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
        let target = languages::code_for(ProviderType::Microsoft, target_lang).ok_or_else(
            || TranslateError::provider(ProviderType::Microsoft, "不支持的目标语言"),
        )?;
        let source = source_lang.and_then(|s| languages::code_for(ProviderType::Microsoft, s));

        let mut query = vec![("api-version", API_VERSION), ("to", target.as_str())];
        if let Some(ref from) = source {
            query.push(("from", from.as_str()));
        }

        let body = self.post("/translate", &query, text).await?;
        Self::parse_translate_response(&body)
    }

    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let body = self
            .post("/detect", &[("api-version", API_VERSION)], text)
            .await?;
        Self::parse_detect_response(&body)
    }
}
