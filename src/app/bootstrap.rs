use std::sync::Arc;

use anyhow::{ensure, Result};
use dogonomics_ai_analysis::{
    EodhdNewsCollector, FinnhubNewsCollector, HttpSentimentScorer, MultiSourceCollector,
    SentimentScorer, SymbolSentimentAggregator,
};
use dogonomics_core::cache::{JsonCache, RedisCache};
use dogonomics_core::config::AppConfig;
use dogonomics_market::{FinnhubClient, MarketDataClient, PolygonClient};
use dogonomics_services::{SentimentService, StockDetailService};
use tracing::{info, warn};

/// 连接缓存；关闭或连不上时返回 None，后续请求直接走上游
pub async fn connect_cache(config: &AppConfig) -> Option<Arc<dyn JsonCache>> {
    if !config.enable_cache {
        info!("缓存未启用 (ENABLE_CACHE=false)");
        return None;
    }
    match RedisCache::connect(&config.redis_url).await {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Redis 不可用，继续运行但不使用缓存: {}", e);
            None
        }
    }
}

pub fn build_scorer(config: &AppConfig) -> Result<Arc<dyn SentimentScorer>> {
    let scorer = HttpSentimentScorer::new(&config.sentiment_endpoint, config.request_timeout)?
        .with_max_retries(config.sentiment_max_retries);
    Ok(Arc::new(scorer))
}

/// 只注册配置了 key 的新闻源
pub fn build_news_collector(config: &AppConfig) -> Result<MultiSourceCollector> {
    let mut collector = MultiSourceCollector::new();
    if config.finnhub_api_key.is_some() {
        let finnhub =
            FinnhubNewsCollector::new(config.finnhub_api_key.clone(), config.request_timeout)?;
        collector = collector.with_source("finnhub", Arc::new(finnhub));
    }
    if config.eodhd_api_key.is_some() {
        let eodhd = EodhdNewsCollector::new(config.eodhd_api_key.clone(), config.request_timeout)?;
        collector = collector.with_source("eodhd", Arc::new(eodhd));
    }
    if collector.is_empty() {
        warn!("未配置任何新闻源 (FINNHUB_API_KEY / EODHD_API_KEY)");
    } else {
        info!("新闻源数量: {}", collector.len());
    }
    Ok(collector)
}

pub fn build_sentiment_service(
    config: &AppConfig,
    cache: Option<Arc<dyn JsonCache>>,
    concurrency: usize,
    news_limit: usize,
) -> Result<SentimentService> {
    ensure!(concurrency > 0, "concurrency must be at least 1");
    ensure!(news_limit > 0, "news limit must be at least 1");

    let collector = build_news_collector(config)?;
    let aggregator =
        SymbolSentimentAggregator::new(build_scorer(config)?).with_concurrency(concurrency);

    let service = SentimentService::new(Arc::new(collector), aggregator).with_news_limit(news_limit);
    Ok(match cache {
        Some(cache) => service.with_cache(cache, config.cache_ttl),
        None => service,
    })
}

pub fn build_stock_detail_service(
    config: &AppConfig,
    cache: Option<Arc<dyn JsonCache>>,
) -> Result<StockDetailService> {
    let finnhub = FinnhubClient::new(config.finnhub_api_key.clone(), config.request_timeout)?;
    let polygon = PolygonClient::new(config.polygon_api_key.clone(), config.request_timeout)?;
    let provider = MarketDataClient::new(finnhub, polygon);

    let service = StockDetailService::new(Arc::new(provider));
    Ok(match cache {
        Some(cache) => service.with_cache(cache, config.cache_ttl),
        None => service,
    })
}
