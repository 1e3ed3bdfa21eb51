use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 日线数据点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicator {
    pub name: String,
    pub value: f64,
    /// "BUY" / "SELL" / "HOLD"
    pub signal: String,
    pub timestamp: DateTime<Utc>,
}
