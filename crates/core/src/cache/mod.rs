//! 缓存管理
//!
//! 缓存是可选的外部协作方：读写失败只记录日志，不影响请求本身。

pub mod redis_client;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::AppResult;

// 重新导出
pub use redis_client::RedisCache;

/// 以字符串形式存取 JSON 的缓存接口
#[async_trait]
pub trait JsonCache: Send + Sync {
    /// 未命中返回 `Ok(None)`
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// 读取并反序列化；缓存异常或数据损坏都按未命中处理，损坏的条目会被删除
pub async fn get_json<T: DeserializeOwned>(cache: &dyn JsonCache, key: &str) -> Option<T> {
    match cache.get_raw(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("缓存数据无法解析，删除: key={}, err={}", key, e);
                if let Err(e) = cache.delete(key).await {
                    warn!("删除缓存失败: key={}, err={}", key, e);
                }
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("读取缓存失败: key={}, err={}", key, e);
            None
        }
    }
}

/// 序列化并写入；失败只记录日志
pub async fn set_json<T: Serialize + Sync>(cache: &dyn JsonCache, key: &str, value: &T, ttl: Duration) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("缓存序列化失败: key={}, err={}", key, e);
            return;
        }
    };
    if let Err(e) = cache.set_raw(key, &raw, ttl).await {
        warn!("写入缓存失败: key={}, err={}", key, e);
    }
}
