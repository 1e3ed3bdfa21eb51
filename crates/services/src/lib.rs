//! # Dogonomics Services
//!
//! 应用服务层：组合新闻采集、情绪聚合、行情拼装与缓存
//!
//! ## 架构位置
//!
//! ```text
//! CLI → services (业务协调) → ai-analysis / market + core (缓存)
//! ```
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use dogonomics_services::SentimentService;
//!
//! let service = SentimentService::new(collector, aggregator).with_cache(cache, ttl);
//! let report = service.analyze_symbol(&ctx, "AAPL").await?;
//! ```

pub mod market;
pub mod sentiment;

// 重新导出常用服务
pub use market::{stock_detail_cache_key, StockDetailService};
pub use sentiment::{
    clamp_general_limit, general_news_cache_key, sentiment_cache_key, GeneralNewsReport,
    SentimentReport, SentimentService, DEFAULT_NEWS_CATEGORY, GENERAL_NEWS_MAX_LIMIT,
};
