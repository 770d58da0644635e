//! 翻译 Provider 门面
//!
//! 将多个翻译/检测后端封装为单一契约：按优先级顺序尝试，失败时
//! 回退到下一个符合条件的 Provider。优先级固定为
//! DeepL → Google → Microsoft，启用状态由凭证是否配置决定。

mod deepl;
mod google;
mod microsoft;

pub use deepl::DeeplProvider;
pub use google::GoogleProvider;
pub use microsoft::MicrosoftProvider;

use crate::config::ProvidersConfig;
use crate::error::TranslateError;
use crate::languages;
use crate::logger::sanitize_log_message;
use crate::ProviderType;
use async_trait::async_trait;

/// 翻译 Provider 统一契约
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn kind(&self) -> ProviderType;

    /// 凭证是否已配置
    fn enabled(&self) -> bool;

    /// 是否支持该内部目标语言代码
    fn supports_target(&self, internal_code: &str) -> bool {
        languages::provider_supports(self.kind(), internal_code)
    }

    /// 是否具备语言检测能力
    fn can_detect(&self) -> bool {
        false
    }

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError>;

    async fn detect(&self, _text: &str) -> Result<String, TranslateError> {
        Err(TranslateError::provider(self.kind(), "不支持语言检测"))
    }
}

/// 翻译门面：优先级有序的 Provider 回退链
pub struct TranslationFacade {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl TranslationFacade {
    pub fn new(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    /// 从配置构建默认的 Provider 链
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let client = reqwest::Client::new();
        let providers: Vec<Box<dyn TranslationProvider>> = vec![
            Box::new(DeeplProvider::new(config.deepl.clone(), client.clone())),
            Box::new(GoogleProvider::new(config.google.clone(), client.clone())),
            Box::new(MicrosoftProvider::new(config.microsoft.clone(), client)),
        ];
        Self::new(providers)
    }

    /// 已启用的 Provider 类型列表（按优先级）
    pub fn enabled_providers(&self) -> Vec<ProviderType> {
        self.providers
            .iter()
            .filter(|p| p.enabled())
            .map(|p| p.kind())
            .collect()
    }

    /// 翻译文本
    ///
    /// 按优先级迭代：跳过未启用或不支持目标语言的 Provider，
    /// 首个成功立即返回；单个 Provider 的失败只记录并回退。
    /// 全部失败时返回携带逐 Provider 错误列表的聚合错误。
    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError> {
        let mut errors = Vec::new();

        for provider in &self.providers {
            if !provider.enabled() || !provider.supports_target(target_lang) {
                continue;
            }
            match provider.translate(text, target_lang, source_lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    tracing::warn!(
                        "[FACADE] {} 翻译失败，回退到下一个 Provider: {}",
                        provider.kind(),
                        sanitize_log_message(&e.to_string())
                    );
                    errors.push(format!("{}: {}", provider.kind(), e));
                }
            }
        }

        Err(TranslateError::AllProvidersFailed { errors })
    }

    /// 检测文本语言
    ///
    /// 仅在具备检测能力且已启用的 Provider 上回退迭代。
    pub async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let mut errors = Vec::new();
        let mut tried = false;

        for provider in &self.providers {
            if !provider.enabled() || !provider.can_detect() {
                continue;
            }
            tried = true;
            match provider.detect(text).await {
                Ok(lang) => {
                    tracing::debug!("[FACADE] {} 检测到语言: {}", provider.kind(), lang);
                    return Ok(lang);
                }
                Err(e) => {
                    tracing::warn!(
                        "[FACADE] {} 语言检测失败: {}",
                        provider.kind(),
                        sanitize_log_message(&e.to_string())
                    );
                    errors.push(format!("{}: {}", provider.kind(), e));
                }
            }
        }

        if !tried {
            return Err(TranslateError::NoDetectorAvailable);
        }
        Err(TranslateError::DetectionFailed(errors.join("; ")))
    }
}
