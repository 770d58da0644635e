//! 配置模块
//!
//! YAML 配置文件加载与环境变量覆盖。凭证仅通过配置注入，
//! Provider 的启用状态由凭证是否存在决定。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEEPL_BASE_URL: &str = "https://api-free.deepl.com/v2/translate";
const GOOGLE_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const MICROSOFT_BASE_URL: &str = "https://api.cognitive.microsofttranslator.com";

/// 顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// Provider 凭证配置
///
/// 字段为 `None` 的 Provider 被视为禁用。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub deepl: Option<DeeplConfig>,
    pub google: Option<GoogleConfig>,
    pub microsoft: Option<MicrosoftConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeeplConfig {
    pub api_key: String,
    #[serde(default = "default_deepl_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
    #[serde(default = "default_google_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicrosoftConfig {
    pub api_key: String,
    #[serde(default = "default_microsoft_region")]
    pub region: String,
    #[serde(default = "default_microsoft_base_url")]
    pub base_url: String,
}

fn default_deepl_base_url() -> String {
    DEEPL_BASE_URL.to_string()
}

fn default_google_base_url() -> String {
    GOOGLE_BASE_URL.to_string()
}

fn default_microsoft_base_url() -> String {
    MICROSOFT_BASE_URL.to_string()
}

fn default_microsoft_region() -> String {
    "global".to_string()
}

/// 中继行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 默认触发表情（各社区可在设置中覆盖）
    pub trigger_emoji: String,
    /// 译文回复的存活时长（毫秒）
    pub reply_ttl_ms: u64,
    /// 扇出任务之间的启动间隔（毫秒）
    pub fanout_stagger_ms: u64,
    /// 新消息自动添加触发表情前的延迟（毫秒）
    pub react_delay_ms: u64,
    /// 填充文本跳过规则生效的目标语言
    pub filler_target: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            trigger_emoji: "🌐".to_string(),
            reply_ttl_ms: 120_000,
            fanout_stagger_ms: 100,
            react_delay_ms: 200,
            filler_target: "en".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 默认配置文件路径: ~/.lingocast/config.yaml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lingocast")
            .join("config.yaml")
    }

    /// 从指定路径加载配置，文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self, serde_yaml::Error> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str(&content)?,
            Err(_) => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// 与原始部署方式兼容: DEEPL_API_KEY / GOOGLE_API_KEY /
    /// MICROSOFT_TRANSLATOR_KEY / MICROSOFT_TRANSLATOR_REGION。
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DEEPL_API_KEY") {
            if !key.is_empty() {
                self.providers.deepl = Some(DeeplConfig {
                    api_key: key,
                    base_url: default_deepl_base_url(),
                });
            }
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.is_empty() {
                self.providers.google = Some(GoogleConfig {
                    api_key: key,
                    base_url: default_google_base_url(),
                });
            }
        }
        if let Ok(key) = std::env::var("MICROSOFT_TRANSLATOR_KEY") {
            if !key.is_empty() {
                let region = std::env::var("MICROSOFT_TRANSLATOR_REGION")
                    .unwrap_or_else(|_| default_microsoft_region());
                self.providers.microsoft = Some(MicrosoftConfig {
                    api_key: key,
                    region,
                    base_url: default_microsoft_base_url(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.providers.deepl.is_none());
        assert_eq!(config.relay.reply_ttl_ms, 120_000);
        assert_eq!(config.relay.fanout_stagger_ms, 100);
        assert_eq!(config.relay.trigger_emoji, "🌐");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_yaml_with_defaults_filled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "providers:\n  microsoft:\n    api_key: mskey\nrelay:\n  reply_ttl_ms: 60000\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let ms = config.providers.microsoft.unwrap();
        assert_eq!(ms.api_key, "mskey");
        assert_eq!(ms.region, "global");
        assert!(ms.base_url.contains("microsofttranslator.com"));
        assert_eq!(config.relay.reply_ttl_ms, 60_000);
        // 未指定的字段保持默认
        assert_eq!(config.relay.fanout_stagger_ms, 100);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.relay.reply_ttl_ms, 120_000);
    }
}
