//! 新闻情绪服务

mod sentiment_service;

pub use sentiment_service::{
    clamp_general_limit, general_news_cache_key, sentiment_cache_key, GeneralNewsReport,
    SentimentReport, SentimentService, DEFAULT_NEWS_CATEGORY, GENERAL_NEWS_MAX_LIMIT,
};
