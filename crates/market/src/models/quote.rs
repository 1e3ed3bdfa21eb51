use serde::{Deserialize, Serialize};

use super::flexible_f64;

/// Finnhub 实时报价
///
/// 未知代码时 Finnhub 会把部分字段返回为 `null`，统一读成 0。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "c", default, deserialize_with = "flexible_f64")]
    pub current_price: f64,
    #[serde(rename = "d", default, deserialize_with = "flexible_f64")]
    pub change: f64,
    #[serde(rename = "dp", default, deserialize_with = "flexible_f64")]
    pub percent_change: f64,
    #[serde(rename = "h", default, deserialize_with = "flexible_f64")]
    pub high_price: f64,
    #[serde(rename = "l", default, deserialize_with = "flexible_f64")]
    pub low_price: f64,
    #[serde(rename = "o", default, deserialize_with = "flexible_f64")]
    pub open_price: f64,
    #[serde(rename = "pc", default, deserialize_with = "flexible_f64")]
    pub previous_close: f64,
    /// Unix 秒
    #[serde(rename = "t", default)]
    pub timestamp: i64,
}
