//! 行情服务

mod stock_detail_service;

pub use stock_detail_service::{stock_detail_cache_key, StockDetailService};
