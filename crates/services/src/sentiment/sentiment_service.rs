use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dogonomics_ai_analysis::{
    summarize, Article, NewsCollector, NewsSentimentSummary, StockSentimentAnalysis,
    SymbolSentimentAggregator,
};
use dogonomics_core::cache::{get_json, set_json, JsonCache};
use dogonomics_core::config::DEFAULT_NEWS_LIMIT;
use dogonomics_workerpool::TaskContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 市场新闻单次最多分析的条数
pub const GENERAL_NEWS_MAX_LIMIT: usize = 10;
pub const DEFAULT_NEWS_CATEGORY: &str = "general";

pub fn sentiment_cache_key(symbol: &str) -> String {
    format!("sentiment:{}", symbol.to_uppercase())
}

pub fn general_news_cache_key(category: &str, limit: usize) -> String {
    format!("general_news:{}:{}", category, limit)
}

/// 0 取默认值，超过上限按上限
pub fn clamp_general_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_NEWS_LIMIT,
        n => n.min(GENERAL_NEWS_MAX_LIMIT),
    }
}

/// 情绪分析结果：聚合结论加上逐篇打分后的文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub symbol: String,
    pub aggregate_result: StockSentimentAnalysis,
    pub news_items: Vec<Article>,
}

/// 市场综合新闻的情绪结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralNewsReport {
    pub category: String,
    pub count: usize,
    pub aggregate_sentiment: NewsSentimentSummary,
    /// 按置信度过滤后的归约结论，`symbol` 字段为分类名
    pub aggregate_result: StockSentimentAnalysis,
    pub articles: Vec<Article>,
}

/// 新闻情绪服务
///
/// 拉取新闻 → 情绪聚合 → 写缓存。只有新闻拉取失败会返回错误，
/// 单篇打分失败由聚合器吸收。
pub struct SentimentService {
    collector: Arc<dyn NewsCollector>,
    aggregator: SymbolSentimentAggregator,
    cache: Option<Arc<dyn JsonCache>>,
    cache_ttl: Duration,
    news_limit: usize,
}

impl SentimentService {
    pub fn new(collector: Arc<dyn NewsCollector>, aggregator: SymbolSentimentAggregator) -> Self {
        Self {
            collector,
            aggregator,
            cache: None,
            cache_ttl: Duration::from_secs(300),
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn JsonCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_news_limit(mut self, news_limit: usize) -> Self {
        self.news_limit = news_limit;
        self
    }

    /// 分析一只股票的新闻情绪
    pub async fn analyze_symbol(&self, ctx: &TaskContext, symbol: &str) -> Result<SentimentReport> {
        let symbol = symbol.trim().to_uppercase();
        let key = sentiment_cache_key(&symbol);

        if let Some(cache) = &self.cache {
            if let Some(report) = get_json::<SentimentReport>(cache.as_ref(), &key).await {
                debug!("情绪缓存命中: {}", key);
                return Ok(report);
            }
        }

        let mut articles = self
            .collector
            .collect_by_symbol(ctx, &symbol, self.news_limit)
            .await
            .with_context(|| format!("failed to fetch news for {}", symbol))?;
        info!("拉取到 {} 篇新闻: symbol={}", articles.len(), symbol);

        let aggregate_result = self.aggregator.analyze(ctx, &symbol, &mut articles).await;
        let report = SentimentReport {
            symbol,
            aggregate_result,
            news_items: articles,
        };

        // 被取消时的结论不完整，不缓存
        if let Some(cache) = &self.cache {
            if !ctx.is_done() {
                set_json(cache.as_ref(), &key, &report, self.cache_ttl).await;
            }
        }
        Ok(report)
    }

    /// 分析某个分类的市场综合新闻，`limit` 经 [`clamp_general_limit`] 处理
    pub async fn analyze_general(
        &self,
        ctx: &TaskContext,
        category: &str,
        limit: usize,
    ) -> Result<GeneralNewsReport> {
        let category = match category.trim() {
            "" => DEFAULT_NEWS_CATEGORY.to_string(),
            c => c.to_lowercase(),
        };
        let limit = clamp_general_limit(limit);
        let key = general_news_cache_key(&category, limit);

        if let Some(cache) = &self.cache {
            if let Some(report) = get_json::<GeneralNewsReport>(cache.as_ref(), &key).await {
                debug!("市场新闻缓存命中: {}", key);
                return Ok(report);
            }
        }

        let mut articles = self
            .collector
            .collect_general(ctx, &category, limit)
            .await
            .with_context(|| format!("failed to fetch {} market news", category))?;
        info!("拉取到 {} 篇市场新闻: category={}", articles.len(), category);

        let aggregate_result = self.aggregator.analyze(ctx, &category, &mut articles).await;
        let report = GeneralNewsReport {
            count: articles.len(),
            aggregate_sentiment: summarize(&articles),
            aggregate_result,
            category,
            articles,
        };

        if let Some(cache) = &self.cache {
            if !ctx.is_done() {
                set_json(cache.as_ref(), &key, &report, self.cache_ttl).await;
            }
        }
        Ok(report)
    }
}
