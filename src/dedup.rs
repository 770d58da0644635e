//! 去重守卫
//!
//! 保证同一 (消息, 目标语言) 键在任意时刻至多一个处理中的翻译请求。
//! 无排队、无背压：获取失败的请求直接丢弃，后续反应会重新触发。

use crate::cache::TranslationCache;
use crate::models::RequestKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Instant;

/// 处理中标记集合
#[derive(Default)]
pub struct InFlightGuard {
    /// 请求键 → 获取时间
    markers: DashMap<RequestKey, Instant>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原子检查并插入处理中标记
    ///
    /// 缓存中已存在完成记录、或已有处理中标记时返回 false，
    /// 调用方不得继续处理。
    pub fn try_acquire(&self, cache: &TranslationCache, key: &RequestKey) -> bool {
        if cache.is_completed(key.message_id, &key.target_lang) {
            return false;
        }
        match self.markers.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Instant::now());
                true
            }
        }
    }

    /// 无条件移除处理中标记
    ///
    /// 每个任务的每条退出路径（成功、跳过、失败）恰好调用一次。
    pub fn release(&self, key: &RequestKey) {
        self.markers.remove(key);
    }

    /// 当前处理中的请求数
    pub fn in_flight(&self) -> usize {
        self.markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReplyTarget;

    #[test]
    fn test_acquire_then_release() {
        let cache = TranslationCache::new();
        let guard = InFlightGuard::new();
        let key = RequestKey::new(1, "ja");

        assert!(guard.try_acquire(&cache, &key));
        assert_eq!(guard.in_flight(), 1);

        // 处理中不可重复获取
        assert!(!guard.try_acquire(&cache, &key));

        guard.release(&key);
        assert_eq!(guard.in_flight(), 0);
        assert!(guard.try_acquire(&cache, &key));
    }

    #[test]
    fn test_completed_blocks_acquisition() {
        let cache = TranslationCache::new();
        let guard = InFlightGuard::new();
        let key = RequestKey::new(1, "ja");

        cache.record_completion(1, "ja", ReplyTarget::Reply(100));
        assert!(!guard.try_acquire(&cache, &key));
    }

    #[test]
    fn test_independent_keys() {
        let cache = TranslationCache::new();
        let guard = InFlightGuard::new();

        assert!(guard.try_acquire(&cache, &RequestKey::new(1, "ja")));
        assert!(guard.try_acquire(&cache, &RequestKey::new(1, "fr")));
        assert!(guard.try_acquire(&cache, &RequestKey::new(2, "ja")));
        assert_eq!(guard.in_flight(), 3);
    }

    #[test]
    fn test_release_is_unconditional() {
        let cache = TranslationCache::new();
        let guard = InFlightGuard::new();
        let key = RequestKey::new(1, "ja");

        // 未获取也可释放（空操作）
        guard.release(&key);
        assert!(guard.try_acquire(&cache, &key));
    }
}
