//! # Dogonomics AI Analysis
//!
//! 新闻情绪分析：文章采集、单篇情绪打分、按股票聚合出交易建议

pub mod aggregator;
pub mod news_collector;
pub mod sentiment_analyzer;

// 重新导出核心类型
pub use aggregator::{
    analyze, recommend, reduce, summarize, NewsSentimentSummary, Recommendation,
    SentimentCounts, StockSentimentAnalysis, SymbolSentimentAggregator, DEFAULT_CONCURRENCY,
    MIN_CONFIDENCE,
};
pub use news_collector::{
    Article, EodhdNewsCollector, FinnhubNewsCollector, MultiSourceCollector, NewsCollector,
};
pub use sentiment_analyzer::{
    article_text, process_logits, HttpSentimentScorer, SentimentLabel, SentimentOutcome,
    SentimentScorer, SerializedScorer,
};
