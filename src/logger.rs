//! 日志模块
//!
//! tracing 初始化与 Provider 错误日志脱敏。Provider 的错误消息可能
//! 携带请求 URL 或请求头（内含 API Key），记录前必须脱敏。

use crate::config::LoggingConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing 订阅器
///
/// 重复调用是无害的（后续调用被忽略），便于测试。
pub fn init(config: &LoggingConfig) {
    if !config.enabled {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

static SANITIZE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // DeepL 认证头
        (r"DeepL-Auth-Key\s+[A-Za-z0-9:._-]+", "DeepL-Auth-Key ***"),
        // Google API Key 查询参数
        (r"key=[A-Za-z0-9._-]+", "key=***"),
        // Microsoft 订阅 Key 请求头
        (
            r#"Ocp-Apim-Subscription-Key["':\s=]+[A-Za-z0-9._-]+"#,
            "Ocp-Apim-Subscription-Key: ***",
        ),
        // 通用 api_key / token 字段
        (
            r#"api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "api_key: ***",
        ),
        (r#"token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#, "token: ***"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(pattern).ok().map(|re| (re, replacement))
    })
    .collect()
});

/// 日志消息脱敏
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in SANITIZE_PATTERNS.iter() {
        sanitized = re.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}
