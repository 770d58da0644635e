//! 翻译缓存与 TTL 过期管理
//!
//! 记录已完成的翻译（消息 ID → 目标语言 → 回复目标），并为每条
//! 已发送的译文回复调度定时删除。同一回复 ID 重复调度采用
//! 取消并替换语义。`clear_all` 用于进程关闭与测试。

use crate::error::GatewayError;
use crate::models::ReplyTarget;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// 已调度的删除定时器
struct DeletionTimer {
    /// 预定触发时间（观测用）
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

/// 翻译缓存
///
/// 所有映射通过 dashmap 的原子 entry 操作修改，并发任务不会观测到
/// 中间状态。
#[derive(Default)]
pub struct TranslationCache {
    /// 消息 ID → (目标语言 → 回复目标)
    completed: DashMap<u64, HashMap<String, ReplyTarget>>,
    /// 回复 ID → 删除定时器
    timers: DashMap<u64, DeletionTimer>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 消息是否已翻译为指定目标语言
    pub fn is_completed(&self, message_id: u64, target_lang: &str) -> bool {
        self.completed
            .get(&message_id)
            .map(|langs| langs.contains_key(target_lang))
            .unwrap_or(false)
    }

    /// 获取已完成翻译的回复目标
    pub fn reply_target(&self, message_id: u64, target_lang: &str) -> Option<ReplyTarget> {
        self.completed
            .get(&message_id)
            .and_then(|langs| langs.get(target_lang).copied())
    }

    /// 记录翻译完成（终态转换）
    ///
    /// 已有终态条目不会被覆盖；迟到的重复完成被丢弃并记录日志。
    /// 返回是否实际写入。
    pub fn record_completion(
        &self,
        message_id: u64,
        target_lang: &str,
        target: ReplyTarget,
    ) -> bool {
        let mut langs = self.completed.entry(message_id).or_default();
        if langs.contains_key(target_lang) {
            tracing::warn!(
                "[CACHE] 丢弃迟到的重复完成: {}:{}",
                message_id,
                target_lang
            );
            return false;
        }
        langs.insert(target_lang.to_string(), target);
        true
    }

    /// 移除翻译标记
    ///
    /// `target_lang` 为 `None` 时移除该消息的所有语言条目。
    pub fn remove_translated(&self, message_id: u64, target_lang: Option<&str>) {
        match target_lang {
            Some(lang) => {
                if let Some(mut langs) = self.completed.get_mut(&message_id) {
                    langs.remove(lang);
                    if langs.is_empty() {
                        drop(langs);
                        self.completed.remove_if(&message_id, |_, v| v.is_empty());
                    }
                }
            }
            None => {
                self.completed.remove(&message_id);
            }
        }
    }

    /// 调度译文回复的自动删除
    ///
    /// 同一 `reply_id` 的既有定时器被取消并替换。定时器触发后先执行
    /// 删除协作者，随后无条件移除缓存条目与定时器注册 —— 即使删除
    /// 失败也要移除，避免缓存无限增长。
    pub fn schedule_expiry<F>(
        self: &Arc<Self>,
        message_id: u64,
        target_lang: &str,
        reply_id: u64,
        delay: Duration,
        delete: F,
    ) where
        F: Future<Output = Result<(), GatewayError>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        let lang = target_lang.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(e) = delete.await {
                tracing::warn!("[CACHE] 无法删除译文回复 {}: {}", reply_id, e);
            }

            cache.remove_translated(message_id, Some(&lang));
            cache.timers.remove(&reply_id);
        });

        let fire_at = Utc::now() + ChronoDuration::milliseconds(delay.as_millis() as i64);
        if let Some(prior) = self.timers.insert(reply_id, DeletionTimer { fire_at, handle }) {
            prior.handle.abort();
        }
    }

    /// 取消某条回复的自动删除定时器
    pub fn cancel_expiry(&self, reply_id: u64) {
        if let Some((_, timer)) = self.timers.remove(&reply_id) {
            timer.handle.abort();
        }
    }

    /// 查询某条回复的预定删除时间
    pub fn expiry_at(&self, reply_id: u64) -> Option<DateTime<Utc>> {
        self.timers.get(&reply_id).map(|t| t.fire_at)
    }

    /// 全量重置：取消所有定时器并清空缓存
    pub fn clear_all(&self) {
        for entry in self.timers.iter() {
            entry.value().handle.abort();
        }
        self.timers.clear();
        self.completed.clear();
    }

    /// 待触发的定时器数量
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_record_and_query() {
        let cache = TranslationCache::new();
        assert!(!cache.is_completed(1, "ja"));

        assert!(cache.record_completion(1, "ja", ReplyTarget::Reply(100)));
        assert!(cache.is_completed(1, "ja"));
        assert!(!cache.is_completed(1, "fr"));
        assert_eq!(cache.reply_target(1, "ja"), Some(ReplyTarget::Reply(100)));
    }

    #[test]
    fn test_terminal_entry_not_overwritten() {
        let cache = TranslationCache::new();
        assert!(cache.record_completion(1, "ja", ReplyTarget::Reply(100)));
        // 迟到的重复完成被丢弃
        assert!(!cache.record_completion(1, "ja", ReplyTarget::Reply(999)));
        assert_eq!(cache.reply_target(1, "ja"), Some(ReplyTarget::Reply(100)));
    }

    #[test]
    fn test_skip_sentinel() {
        let cache = TranslationCache::new();
        cache.record_completion(1, "en", ReplyTarget::Skipped);
        assert!(cache.is_completed(1, "en"));
        assert_eq!(cache.reply_target(1, "en").unwrap().reply_id(), None);
    }

    #[test]
    fn test_remove_translated_single_and_all() {
        let cache = TranslationCache::new();
        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        cache.record_completion(1, "fr", ReplyTarget::Reply(101));

        cache.remove_translated(1, Some("ja"));
        assert!(!cache.is_completed(1, "ja"));
        assert!(cache.is_completed(1, "fr"));

        cache.remove_translated(1, None);
        assert!(!cache.is_completed(1, "fr"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_deletes_and_purges() {
        let cache = Arc::new(TranslationCache::new());
        let deletions = Arc::new(AtomicU32::new(0));

        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        let counter = Arc::clone(&deletions);
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(120_000), async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(cache.pending_timers(), 1);

        // 未到期之前不触发
        tokio::time::sleep(Duration::from_millis(119_000)).await;
        assert_eq!(deletions.load(Ordering::SeqCst), 0);
        assert!(cache.is_completed(1, "ja"));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(deletions.load(Ordering::SeqCst), 1);
        assert!(!cache.is_completed(1, "ja"));
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_purges_even_when_delete_fails() {
        let cache = Arc::new(TranslationCache::new());
        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(1_000), async {
            Err(GatewayError::Delete("已被删除".to_string()))
        });

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        // 删除失败，缓存条目仍被清除
        assert!(!cache.is_completed(1, "ja"));
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_prior_timer() {
        let cache = Arc::new(TranslationCache::new());
        let deletions = Arc::new(AtomicU32::new(0));

        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        let c1 = Arc::clone(&deletions);
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(1_000), async move {
            c1.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let c2 = Arc::clone(&deletions);
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(5_000), async move {
            c2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(6_000)).await;
        // 第一个定时器被取消，删除只发生一次
        assert_eq!(deletions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_expiry() {
        let cache = Arc::new(TranslationCache::new());
        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(1_000), async { Ok(()) });

        cache.cancel_expiry(100);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        // 取消后不再清除缓存条目
        assert!(cache.is_completed(1, "ja"));
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all() {
        let cache = Arc::new(TranslationCache::new());
        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        cache.record_completion(2, "fr", ReplyTarget::Reply(101));
        cache.schedule_expiry(1, "ja", 100, Duration::from_millis(1_000), async { Ok(()) });
        cache.schedule_expiry(2, "fr", 101, Duration::from_millis(1_000), async { Ok(()) });

        cache.clear_all();
        assert_eq!(cache.pending_timers(), 0);
        assert!(!cache.is_completed(1, "ja"));
        assert!(!cache.is_completed(2, "fr"));
    }
}
