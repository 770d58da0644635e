//! lingocast 核心库
//!
//! 反应触发的聊天翻译中继引擎：用户对一条消息添加社区配置的触发表情后，
//! 引擎根据其身分组解析目标语言集合，经由多 Provider 回退链完成翻译，
//! 每个目标语言回复一条译文，并在固定 TTL 后自动删除回复。
//!
//! 平台事件投递、身分组→语言的持久化存储、本地化字串与命令面板
//! 均为外部协作者，以 trait 形式注入（见 `orchestrator` 模块）。

pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod languages;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod providers;

use serde::{Deserialize, Serialize};

pub use cache::TranslationCache;
pub use dedup::InFlightGuard;
pub use error::{GatewayError, TranslateError};
pub use orchestrator::{ChatGateway, GuildSettings, ReactionRelay, RelayOptions};
pub use providers::TranslationFacade;

/// 翻译 Provider 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    DeepL,
    Google,
    Microsoft,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::DeepL => "deepl",
            ProviderType::Google => "google",
            ProviderType::Microsoft => "microsoft",
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(ProviderType::DeepL),
            "google" => Ok(ProviderType::Google),
            "microsoft" => Ok(ProviderType::Microsoft),
            _ => Err(format!("Invalid provider type: {s}")),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_type_roundtrip() {
        for p in [
            ProviderType::DeepL,
            ProviderType::Google,
            ProviderType::Microsoft,
        ] {
            assert_eq!(ProviderType::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn test_provider_type_invalid() {
        assert!(ProviderType::from_str("yandex").is_err());
    }
}
