//! 个股详情并发拼装
//!
//! 日线、档案、财务、报价四个请求同时发出并全部等待结束。
//! 任一失败则整体失败，不返回残缺的详情。

use dogonomics_workerpool::{ContextError, TaskContext};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::StockDetailData;
use crate::providers::StockDataProvider;

/// 详情页日线回看天数
pub const DETAIL_CHART_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("request cancelled: {0}")]
    Cancelled(#[from] ContextError),

    #[error("failed to fetch historical data: {0:#}")]
    Chart(anyhow::Error),

    #[error("failed to get company profile: {0:#}")]
    Profile(anyhow::Error),

    #[error("failed to get basic financials: {0:#}")]
    Financials(anyhow::Error),

    #[error("failed to get quote: {0:#}")]
    Quote(anyhow::Error),
}

impl DetailError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DetailError::Cancelled(_))
    }
}

/// 拼装个股详情
///
/// 上下文被取消时优先报告取消；否则按 日线 → 档案 → 财务 → 报价 的固定顺序
/// 报告第一个错误，与完成先后无关。
pub async fn build_stock_detail(
    ctx: &TaskContext,
    provider: &dyn StockDataProvider,
    symbol: &str,
) -> Result<StockDetailData, DetailError> {
    let (chart, profile, financials, quote) = tokio::join!(
        provider.historical_data(ctx, symbol, DETAIL_CHART_DAYS),
        provider.company_profile(ctx, symbol),
        provider.basic_financials(ctx, symbol),
        provider.quote(ctx, symbol),
    );

    if let Some(err) = ctx.err() {
        warn!("个股详情请求已取消: symbol={}, reason={}", symbol, err);
        return Err(DetailError::Cancelled(err));
    }

    let chart = chart.map_err(DetailError::Chart)?;
    let profile = profile.map_err(DetailError::Profile)?;
    let financials = financials.map_err(DetailError::Financials)?;
    let quote = quote.map_err(DetailError::Quote)?;

    let detail = StockDetailData::assemble(symbol, chart, profile, &financials, &quote);
    info!(
        "个股详情拼装完成: symbol={}, price={}, chart_points={}",
        symbol,
        detail.current_price,
        detail.chart_data.len()
    );
    Ok(detail)
}
