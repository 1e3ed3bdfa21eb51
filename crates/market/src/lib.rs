//! # Dogonomics Market
//!
//! 行情数据：Finnhub / Polygon 客户端、数据模型、个股详情并发拼装

pub mod fan_out;
pub mod models;
pub mod providers;

// 重新导出常用类型
pub use fan_out::{build_stock_detail, DetailError, DETAIL_CHART_DAYS};
pub use models::*;
pub use providers::{FinnhubClient, MarketDataClient, PolygonClient, StockDataProvider};
