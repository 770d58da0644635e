//! 扇出编排器
//!
//! 从一次触发反应出发：校验事件、解析目标语言集合、检测一次源语言，
//! 然后为每个目标语言派发一个独立的异步翻译任务。任务之间以固定
//! 间隔错开启动以限制对 Provider 的新增请求速率，完成顺序不作保证。
//!
//! 身分组→语言映射、频道监听列表与平台网关均为外部协作者，
//! 以 trait 注入。

use crate::cache::TranslationCache;
use crate::config::RelayConfig;
use crate::dedup::InFlightGuard;
use crate::error::GatewayError;
use crate::languages;
use crate::logger::sanitize_log_message;
use crate::models::{EmojiRef, Message, ReactionEvent, ReplyTarget, RequestKey};
use crate::providers::TranslationFacade;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// 社区设置查询（外部存储的只读视图）
pub trait GuildSettings: Send + Sync {
    /// 社区配置的触发表情 Token（Unicode 字面值或 `<:name:id>`）
    fn trigger_emoji(&self, guild_id: u64) -> String;

    /// 身分组集合映射到的目标语言并集（去重，保持插入顺序）
    fn languages_for_roles(&self, guild_id: u64, role_ids: &[u64]) -> Vec<String>;

    /// 频道是否在监听列表中
    fn is_channel_listening(&self, channel_id: u64, guild_id: u64) -> bool;
}

/// 聊天平台网关（回复投递 / 删除 / 反应 / 成员查询）
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// 查询成员的身分组 ID 列表
    async fn member_role_ids(&self, guild_id: u64, user_id: u64)
        -> Result<Vec<u64>, GatewayError>;

    /// 以回复形式发送译文，返回新消息 ID
    async fn reply(&self, channel_id: u64, message_id: u64, text: &str)
        -> Result<u64, GatewayError>;

    /// 删除一条消息（消息不存在或无权限为可恢复警告）
    async fn delete_message(&self, channel_id: u64, reply_id: u64) -> Result<(), GatewayError>;

    /// 为消息添加反应表情
    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> Result<(), GatewayError>;
}

/// 中继行为选项
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// 译文回复的存活时长
    pub reply_ttl: Duration,
    /// 扇出任务之间的启动间隔
    pub fanout_stagger: Duration,
    /// 自动添加触发表情前的延迟
    pub react_delay: Duration,
    /// 填充文本跳过规则生效的目标语言
    pub filler_target: String,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

impl RelayOptions {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            reply_ttl: Duration::from_millis(config.reply_ttl_ms),
            fanout_stagger: Duration::from_millis(config.fanout_stagger_ms),
            react_delay: Duration::from_millis(config.react_delay_ms),
            filler_target: config.filler_target.clone(),
        }
    }
}

/// 反应触发的翻译中继引擎
pub struct ReactionRelay {
    facade: Arc<TranslationFacade>,
    cache: Arc<TranslationCache>,
    guard: Arc<InFlightGuard>,
    settings: Arc<dyn GuildSettings>,
    gateway: Arc<dyn ChatGateway>,
    options: RelayOptions,
}

impl ReactionRelay {
    pub fn new(
        facade: Arc<TranslationFacade>,
        settings: Arc<dyn GuildSettings>,
        gateway: Arc<dyn ChatGateway>,
        options: RelayOptions,
    ) -> Self {
        Self {
            facade,
            cache: Arc::new(TranslationCache::new()),
            guard: Arc::new(InFlightGuard::new()),
            settings,
            gateway,
            options,
        }
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// 进程关闭时的全量清理
    pub fn shutdown(&self) {
        self.cache.clear_all();
    }

    /// 反应事件入口（即发即忘，不阻塞调用方）
    pub fn handle_reaction(self: &Arc<Self>, event: ReactionEvent, message: Message) {
        let relay = Arc::clone(self);
        tokio::spawn(async move {
            relay.process_reaction(event, message).await;
        });
    }

    /// 新消息入口（即发即忘）：自动添加触发表情
    pub fn handle_message(self: &Arc<Self>, message: Message) {
        let relay = Arc::clone(self);
        tokio::spawn(async move {
            relay.process_message(message).await;
        });
    }

    /// 反应事件的完整处理流程
    pub async fn process_reaction(self: Arc<Self>, event: ReactionEvent, message: Message) {
        // 忽略机器人自己的反应
        if event.user_is_bot {
            return;
        }
        // 只在社区内运作
        let Some(guild_id) = message.guild_id else {
            return;
        };

        let trigger = EmojiRef::parse_token(&self.settings.trigger_emoji(guild_id));
        if event.emoji != trigger {
            return;
        }
        tracing::debug!("[RELAY] [{}] 侦测到触发反应: {}", guild_id, event.emoji);

        if !self
            .settings
            .is_channel_listening(message.channel_id, guild_id)
        {
            tracing::debug!(
                "[RELAY] [{}] 忽略反应: 频道 {} 未监听",
                guild_id,
                message.channel_id
            );
            return;
        }
        if message.content.trim().is_empty() {
            tracing::debug!("[RELAY] [{}] 忽略反应: 消息无文本内容", guild_id);
            return;
        }

        let role_ids = match self.gateway.member_role_ids(guild_id, event.user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    "[RELAY] [{}] 无法获取成员 {} 的身分组: {}",
                    guild_id,
                    event.user_id,
                    e
                );
                return;
            }
        };

        let targets = self.settings.languages_for_roles(guild_id, &role_ids);
        if targets.is_empty() {
            tracing::info!(
                "[RELAY] [{}] 使用者 {} 没有对应的翻译语言",
                guild_id,
                event.user_id
            );
            return;
        }
        tracing::info!(
            "[RELAY] [{}] 使用者 {} 的目标语言: {}",
            guild_id,
            event.user_id,
            targets.join(", ")
        );

        // 源语言每次扇出只检测一次，检测失败中止整次扇出
        let source_lang = match self.facade.detect(&message.content).await {
            Ok(lang) => lang,
            Err(e) => {
                tracing::error!("[RELAY] [{}] 检测语言失败: {}", guild_id, e);
                return;
            }
        };
        tracing::info!("[RELAY] [{}] 原始消息语言: {}", guild_id, source_lang);

        // 按插入顺序派发，任务间以固定间隔错开启动
        for target_lang in targets {
            let relay = Arc::clone(&self);
            let msg = message.clone();
            let source = source_lang.clone();
            tokio::spawn(async move {
                relay.translate_one(msg, target_lang, source, guild_id).await;
            });
            tokio::time::sleep(self.options.fanout_stagger).await;
        }
    }

    /// 单个目标语言的翻译任务
    ///
    /// 去重守卫的获取先于 Provider 调用，Provider 调用先于缓存记录
    /// 与过期调度；标记在每条退出路径上恰好释放一次。
    async fn translate_one(&self, message: Message, target_lang: String, source_lang: String, guild_id: u64) {
        let key = RequestKey::new(message.id, target_lang.clone());
        if !self.guard.try_acquire(&self.cache, &key) {
            tracing::debug!(
                "[RELAY] [{}] 跳过 {}: 已翻译或正在处理中",
                guild_id,
                target_lang
            );
            return;
        }

        self.run_translation(&message, &target_lang, &source_lang, guild_id)
            .await;
        self.guard.release(&key);
    }

    async fn run_translation(
        &self,
        message: &Message,
        target_lang: &str,
        source_lang: &str,
        guild_id: u64,
    ) {
        // 跳过判定：相同语言、同为中文变体、或填充文本
        let both_chinese = languages::is_chinese_variant(source_lang)
            && languages::is_chinese_variant(target_lang);
        let filler = target_lang == self.options.filler_target
            && languages::is_untranslatable_filler(&message.content);

        if source_lang == target_lang || both_chinese || filler {
            tracing::info!(
                "[RELAY] [{}] 跳过 {}: 相同语言或特殊文本",
                guild_id,
                target_lang
            );
            self.cache
                .record_completion(message.id, target_lang, ReplyTarget::Skipped);
            return;
        }

        tracing::info!(
            "[RELAY] [{}] 正在翻译 {} -> {}",
            guild_id,
            source_lang,
            target_lang
        );
        let translated = match self
            .facade
            .translate(&message.content, target_lang, Some(source_lang))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                // 守卫标记随后释放，后续反应可重试
                tracing::error!(
                    "[RELAY] [{}] 翻译 {} 失败: {}",
                    guild_id,
                    target_lang,
                    sanitize_log_message(&e.to_string())
                );
                return;
            }
        };

        let reply_id = match self
            .gateway
            .reply(message.channel_id, message.id, &translated)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                // 不记录完成，该翻译仍可重试
                tracing::error!(
                    "[RELAY] [{}] 回复消息失败 ({}): {}",
                    guild_id,
                    target_lang,
                    e
                );
                return;
            }
        };

        if self
            .cache
            .record_completion(message.id, target_lang, ReplyTarget::Reply(reply_id))
        {
            let gateway = Arc::clone(&self.gateway);
            let channel_id = message.channel_id;
            self.cache.schedule_expiry(
                message.id,
                target_lang,
                reply_id,
                self.options.reply_ttl,
                async move { gateway.delete_message(channel_id, reply_id).await },
            );
            tracing::info!(
                "[RELAY] [{}] 成功翻译并回复 {}",
                guild_id,
                target_lang
            );
        }
    }

    /// 新消息的自动反应流程：在监听频道的非机器人消息下添加触发表情
    pub async fn process_message(self: Arc<Self>, message: Message) {
        if message.author_is_bot {
            return;
        }
        let Some(guild_id) = message.guild_id else {
            return;
        };
        if message.content.trim().is_empty() {
            return;
        }
        if !self
            .settings
            .is_channel_listening(message.channel_id, guild_id)
        {
            return;
        }

        let trigger = EmojiRef::parse_token(&self.settings.trigger_emoji(guild_id));

        // 小延迟以避免速率限制
        tokio::time::sleep(self.options.react_delay).await;

        match self
            .gateway
            .add_reaction(message.channel_id, message.id, &trigger)
            .await
        {
            Ok(()) => {}
            Err(GatewayError::UnknownEmoji(e)) => {
                tracing::warn!(
                    "[RELAY] [{}] 无法为消息 {} 添加触发表情 {}: {}",
                    guild_id,
                    message.id,
                    trigger,
                    e
                );
            }
            Err(e) => {
                tracing::error!(
                    "[RELAY] [{}] 为消息 {} 添加触发表情出错: {}",
                    guild_id,
                    message.id,
                    e
                );
            }
        }
    }
}
