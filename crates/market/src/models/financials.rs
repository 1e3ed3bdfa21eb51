use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FlexibleFloat;

/// 市盈率指标名
pub const METRIC_PE: &str = "peBasicExclExtraTTM";
/// 每股收益指标名
pub const METRIC_EPS: &str = "epsBasicExclExtraTTM";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub v: FlexibleFloat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialSeries {
    pub annual: HashMap<String, Vec<PeriodValue>>,
    pub quarterly: HashMap<String, Vec<PeriodValue>>,
}

/// Finnhub 基本财务数据（`/stock/metric?metric=all`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicFinancials {
    pub series: FinancialSeries,
    /// 指标值类型不固定（数字、字符串、null），保留原始 JSON
    pub metric: HashMap<String, Value>,
}

impl BasicFinancials {
    /// 读取数值型指标，缺失或不是数字时返回 0
    pub fn metric_f64(&self, name: &str) -> f64 {
        self.metric.get(name).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn pe_ratio(&self) -> f64 {
        self.metric_f64(METRIC_PE)
    }

    pub fn eps(&self) -> f64 {
        self.metric_f64(METRIC_EPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metric": {
            "peBasicExclExtraTTM": 29.4,
            "epsBasicExclExtraTTM": 6.43,
            "52WeekHigh": 199.62,
            "beta": "N/A",
            "dividendYieldIndicatedAnnual": null
        },
        "series": {
            "annual": {
                "eps": [{"period": "2023-09-30", "v": 6.13}, {"period": "2022-09-24", "v": "6.11"}]
            },
            "quarterly": {}
        },
        "symbol": "AAPL"
    }"#;

    #[test]
    fn reads_pe_and_eps() {
        let financials: BasicFinancials = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(financials.pe_ratio(), 29.4);
        assert_eq!(financials.eps(), 6.43);
    }

    #[test]
    fn non_numeric_metrics_read_as_zero() {
        let financials: BasicFinancials = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(financials.metric_f64("beta"), 0.0);
        assert_eq!(financials.metric_f64("dividendYieldIndicatedAnnual"), 0.0);
        assert_eq!(financials.metric_f64("missing"), 0.0);
    }

    #[test]
    fn series_values_accept_strings() {
        let financials: BasicFinancials = serde_json::from_str(SAMPLE).unwrap();
        let eps = &financials.series.annual["eps"];
        assert_eq!(eps[1].v.value(), 6.11);
    }

    #[test]
    fn empty_response_is_default() {
        let financials: BasicFinancials = serde_json::from_str("{}").unwrap();
        assert!(financials.metric.is_empty());
        assert_eq!(financials.pe_ratio(), 0.0);
    }
}
