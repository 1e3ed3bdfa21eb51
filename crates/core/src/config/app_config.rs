use std::time::Duration;

use crate::config::environment::{env_is_true, env_non_empty, env_or_default, env_u64, env_usize};
use crate::error::{AppError, AppResult};

/// 情绪推理默认并发数：推理服务吞吐有限，保持较小的固定值
pub const DEFAULT_SENTIMENT_CONCURRENCY: usize = 3;
pub const DEFAULT_NEWS_LIMIT: usize = 5;
pub const DEFAULT_SENTIMENT_MAX_RETRIES: usize = 2;

/// 应用配置，全部来自环境变量（启动时先 `dotenv().ok()`）
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: String,
    pub finnhub_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
    pub eodhd_api_key: Option<String>,
    /// 远程情绪推理服务地址
    pub sentiment_endpoint: String,
    pub sentiment_concurrency: usize,
    /// 推理请求遇到临时错误时的重试次数
    pub sentiment_max_retries: usize,
    pub news_limit: usize,
    pub request_timeout: Duration,
    pub enable_cache: bool,
    pub redis_url: String,
    pub cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        let sentiment_concurrency =
            env_usize("SENTIMENT_CONCURRENCY", DEFAULT_SENTIMENT_CONCURRENCY);
        if sentiment_concurrency == 0 {
            return Err(AppError::ConfigError(
                "SENTIMENT_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let news_limit = env_usize("NEWS_LIMIT", DEFAULT_NEWS_LIMIT);
        if news_limit == 0 {
            return Err(AppError::ConfigError(
                "NEWS_LIMIT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            app_env: env_or_default("APP_ENV", "local"),
            finnhub_api_key: env_non_empty("FINNHUB_API_KEY"),
            polygon_api_key: env_non_empty("POLYGON_API_KEY"),
            eodhd_api_key: env_non_empty("EODHD_API_KEY"),
            sentiment_endpoint: env_or_default(
                "SENTIMENT_ENDPOINT",
                "http://127.0.0.1:8000/finbert",
            ),
            sentiment_concurrency,
            sentiment_max_retries: env_usize("SENTIMENT_MAX_RETRIES", DEFAULT_SENTIMENT_MAX_RETRIES),
            news_limit,
            request_timeout: Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECS", 30)),
            enable_cache: env_is_true("ENABLE_CACHE", true),
            redis_url: env_or_default("REDIS_URL", "redis://127.0.0.1:6379/"),
            cache_ttl: Duration::from_secs(env_u64("CACHE_TTL_SECS", 300)),
        })
    }
}
