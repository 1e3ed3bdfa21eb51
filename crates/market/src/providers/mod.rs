//! 行情数据源

mod finnhub;
mod polygon;

use async_trait::async_trait;
use dogonomics_workerpool::TaskContext;

use crate::models::{BasicFinancials, ChartDataPoint, CompanyProfile, Quote};

pub use finnhub::{FinnhubClient, FINNHUB_BASE_URL};
pub use polygon::{parse_aggregates, PolygonClient, MAX_HISTORY_DAYS, POLYGON_BASE_URL};

/// 个股数据提供者
///
/// 每个方法都要在 `ctx` 结束时尽快返回。
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    /// 最近 `days` 天的日线
    async fn historical_data(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        days: u32,
    ) -> anyhow::Result<Vec<ChartDataPoint>>;

    async fn company_profile(&self, ctx: &TaskContext, symbol: &str)
        -> anyhow::Result<CompanyProfile>;

    async fn basic_financials(
        &self,
        ctx: &TaskContext,
        symbol: &str,
    ) -> anyhow::Result<BasicFinancials>;

    async fn quote(&self, ctx: &TaskContext, symbol: &str) -> anyhow::Result<Quote>;
}

/// Finnhub 提供档案、财务、报价，Polygon 提供日线
pub struct MarketDataClient {
    finnhub: FinnhubClient,
    polygon: PolygonClient,
}

impl MarketDataClient {
    pub fn new(finnhub: FinnhubClient, polygon: PolygonClient) -> Self {
        Self { finnhub, polygon }
    }
}

#[async_trait]
impl StockDataProvider for MarketDataClient {
    async fn historical_data(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        days: u32,
    ) -> anyhow::Result<Vec<ChartDataPoint>> {
        self.polygon.historical_data(ctx, symbol, days).await
    }

    async fn company_profile(
        &self,
        ctx: &TaskContext,
        symbol: &str,
    ) -> anyhow::Result<CompanyProfile> {
        self.finnhub.company_profile(ctx, symbol).await
    }

    async fn basic_financials(
        &self,
        ctx: &TaskContext,
        symbol: &str,
    ) -> anyhow::Result<BasicFinancials> {
        self.finnhub.basic_financials(ctx, symbol).await
    }

    async fn quote(&self, ctx: &TaskContext, symbol: &str) -> anyhow::Result<Quote> {
        self.finnhub.quote(ctx, symbol).await
    }
}
