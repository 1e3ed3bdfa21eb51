use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::{debug, error, info};

use super::JsonCache;
use crate::error::{AppError, AppResult};

/// 基于 Redis 多路复用连接的缓存
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// 建立连接并 PING 一次，确认可用
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::CacheError(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client.get_multiplexed_async_connection().await.map_err(|e| {
            error!("Redis connection test failed: {}", redis_url);
            AppError::CacheError(format!("Failed to connect to Redis: {}", e))
        })?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Redis PING -> {}", pong);
        info!("Redis 缓存已连接: {}", redis_url);

        Ok(Self { conn })
    }
}

#[async_trait]
impl JsonCache for RedisCache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        // Redis 的 EX 不接受 0
        let secs = ttl.as_secs().max(1);
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }
}
