//! 配置管理模块

pub mod app_config;
pub mod environment;

// 重新导出
pub use app_config::{
    AppConfig, DEFAULT_NEWS_LIMIT, DEFAULT_SENTIMENT_CONCURRENCY, DEFAULT_SENTIMENT_MAX_RETRIES,
};
pub use environment::*;
