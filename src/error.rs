//! 错误类型定义
//!
//! 翻译链路与平台协作者的错误分类。失败全部被限制在任务边界内，
//! 不会跨目标语言传播，也不会使进程终止。

use crate::ProviderType;
use thiserror::Error;

/// 翻译/检测错误
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    /// 没有启用任何具备检测能力的 Provider
    #[error("没有可用的语言检测服务")]
    NoDetectorAvailable,

    /// 所有检测 Provider 都失败
    #[error("所有语言检测服务都失败: {0}")]
    DetectionFailed(String),

    /// 单个 Provider 调用失败（触发回退到下一个 Provider）
    #[error("{provider} 翻译失败: {message}")]
    Provider {
        provider: ProviderType,
        message: String,
    },

    /// 回退链耗尽：所有符合条件的 Provider 都失败
    #[error("所有翻译服务都失败:\n{}", .errors.join("\n"))]
    AllProvidersFailed { errors: Vec<String> },

    /// Provider 返回了无法解析的响应
    #[error("{provider} 响应格式无效: {message}")]
    InvalidResponse {
        provider: ProviderType,
        message: String,
    },
}

impl TranslateError {
    /// 便捷构造：Provider 调用失败
    pub fn provider(provider: ProviderType, message: impl Into<String>) -> Self {
        TranslateError::Provider {
            provider,
            message: message.into(),
        }
    }

    /// 便捷构造：响应格式无效
    pub fn invalid_response(provider: ProviderType, message: impl Into<String>) -> Self {
        TranslateError::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}

/// 平台协作者错误（回复投递 / 删除 / 添加反应）
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// 回复投递失败
    #[error("回复消息失败: {0}")]
    Reply(String),

    /// 删除消息失败（消息已不存在或无权限，可恢复）
    #[error("删除消息失败: {0}")]
    Delete(String),

    /// 表情不存在或机器人无法访问
    #[error("未知表情: {0}")]
    UnknownEmoji(String),

    /// 缺少权限
    #[error("缺少权限: {0}")]
    MissingPermission(String),

    /// 其他平台错误
    #[error("平台错误: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_providers_failed_joins_errors() {
        let err = TranslateError::AllProvidersFailed {
            errors: vec!["Google: 500".to_string(), "Microsoft: timeout".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Google: 500"));
        assert!(msg.contains("Microsoft: timeout"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = TranslateError::provider(ProviderType::Google, "HTTP 403");
        assert_eq!(err.to_string(), "google 翻译失败: HTTP 403");
    }
}
