use std::sync::Arc;
use std::time::Duration;

use dogonomics_core::cache::{get_json, set_json, JsonCache};
use dogonomics_market::{build_stock_detail, DetailError, StockDataProvider, StockDetailData};
use dogonomics_workerpool::TaskContext;
use tracing::debug;

pub fn stock_detail_cache_key(symbol: &str) -> String {
    format!("stock_detail:{}", symbol.to_uppercase())
}

/// 个股详情服务（缓存 + 并发拼装）
pub struct StockDetailService {
    provider: Arc<dyn StockDataProvider>,
    cache: Option<Arc<dyn JsonCache>>,
    cache_ttl: Duration,
}

impl StockDetailService {
    pub fn new(provider: Arc<dyn StockDataProvider>) -> Self {
        Self {
            provider,
            cache: None,
            cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn JsonCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub async fn stock_detail(
        &self,
        ctx: &TaskContext,
        symbol: &str,
    ) -> Result<StockDetailData, DetailError> {
        let symbol = symbol.trim().to_uppercase();
        let key = stock_detail_cache_key(&symbol);

        if let Some(cache) = &self.cache {
            if let Some(detail) = get_json::<StockDetailData>(cache.as_ref(), &key).await {
                debug!("详情缓存命中: {}", key);
                return Ok(detail);
            }
        }

        let detail = build_stock_detail(ctx, self.provider.as_ref(), &symbol).await?;

        if let Some(cache) = &self.cache {
            set_json(cache.as_ref(), &key, &detail, self.cache_ttl).await;
        }
        Ok(detail)
    }
}
