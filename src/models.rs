//! 核心数据模型
//!
//! 消息、反应事件、表情引用与翻译请求键。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 自定义表情 Token 格式: `<:name:id>` 或 `<a:name:id>`
static CUSTOM_EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<a?:.+:(\d+)>$").expect("invalid custom emoji regex"));

/// 被观测到的一条聊天消息（观测后不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub channel_id: u64,
    /// 所属社区，私讯消息为 None
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub content: String,
    pub author_is_bot: bool,
}

/// 反应事件（瞬态，不持久化）
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message_id: u64,
    pub emoji: EmojiRef,
    pub user_id: u64,
    pub user_is_bot: bool,
}

/// 表情引用
///
/// Unicode 表情按字面值比较；自定义表情按内嵌的数字 ID 比较。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmojiRef {
    Unicode(String),
    Custom(u64),
}

impl EmojiRef {
    /// 解析配置中的表情 Token
    ///
    /// `<a:name:123>` 形式提取数字 ID，其余 Token 视为 Unicode 字面值。
    pub fn parse_token(token: &str) -> Self {
        if let Some(caps) = CUSTOM_EMOJI_RE.captures(token.trim()) {
            if let Ok(id) = caps[1].parse::<u64>() {
                return EmojiRef::Custom(id);
            }
        }
        EmojiRef::Unicode(token.trim().to_string())
    }
}

impl std::fmt::Display for EmojiRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmojiRef::Unicode(s) => write!(f, "{s}"),
            EmojiRef::Custom(id) => write!(f, "custom:{id}"),
        }
    }
}

/// 翻译完成后记录的回复目标
///
/// `Skipped` 为跳过哨兵：源语言与目标语言相同等情况下不调用 Provider、
/// 不发送回复，但请求仍标记为已完成。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    Reply(u64),
    Skipped,
}

impl ReplyTarget {
    pub fn reply_id(&self) -> Option<u64> {
        match self {
            ReplyTarget::Reply(id) => Some(*id),
            ReplyTarget::Skipped => None,
        }
    }
}

/// 翻译请求的复合键 (消息 ID, 目标语言)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub message_id: u64,
    pub target_lang: String,
}

impl RequestKey {
    pub fn new(message_id: u64, target_lang: impl Into<String>) -> Self {
        Self {
            message_id,
            target_lang: target_lang.into(),
        }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.message_id, self.target_lang)
    }
}
