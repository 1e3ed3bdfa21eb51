use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use dogonomics_workerpool::TaskContext;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::ChartDataPoint;

pub const POLYGON_BASE_URL: &str = "https://api.polygon.io";
/// 单次请求最多回看一年
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Polygon 日线客户端
pub struct PolygonClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
}

#[derive(Deserialize)]
struct AggregateBar {
    /// 毫秒时间戳
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

impl PolygonClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Polygon http client")?;
        Ok(Self {
            client,
            api_key,
            base_url: POLYGON_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, api_key: &str, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("adjusted", "true"), ("sort", "asc"), ("apiKey", api_key)])
            .send()
            .await?;

        let status_code = response.status();
        let body = response.text().await?;
        if status_code != StatusCode::OK {
            return Err(anyhow!("Polygon API error: {} - {}", status_code, body));
        }
        Ok(body)
    }

    /// 最近 `days` 天的日线，`days` 限制在 1..=365
    pub async fn historical_data(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<ChartDataPoint>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("POLYGON_API_KEY environment variable not set"))?;

        let days = days.clamp(1, MAX_HISTORY_DAYS);
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(i64::from(days));
        let path = format!(
            "/v2/aggs/ticker/{}/range/1/day/{}/{}",
            symbol.to_uppercase(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        debug!("拉取 Polygon 日线: symbol={}, days={}", symbol, days);
        let body = ctx.run_until_done(self.fetch(api_key, &path)).await??;
        parse_aggregates(&body)
    }
}

/// 解析 Polygon 聚合K线响应
pub fn parse_aggregates(body: &str) -> Result<Vec<ChartDataPoint>> {
    let response: AggregatesResponse =
        serde_json::from_str(body).context("failed to decode Polygon aggregates")?;

    if response.status == "ERROR" {
        return Err(anyhow!("Polygon returned error status: {}", body));
    }

    let bars = response.results.unwrap_or_default();
    let mut points = Vec::with_capacity(bars.len());
    for bar in bars {
        let Some(timestamp) = Utc.timestamp_millis_opt(bar.t).single() else {
            warn!("跳过时间戳非法的日线: t={}", bar.t);
            continue;
        };
        points.push(ChartDataPoint {
            timestamp,
            open: bar.o,
            high: bar.h,
            low: bar.l,
            close: bar.c,
            volume: bar.v as i64,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_daily_bars() {
        let body = r#"{
            "ticker": "AAPL",
            "status": "OK",
            "resultsCount": 2,
            "results": [
                {"v": 51234567.0, "vw": 170.1, "o": 169.5, "c": 171.2, "h": 172.0, "l": 168.9, "t": 1714536000000, "n": 1},
                {"v": 40000000, "o": 171.2, "c": 173.0, "h": 173.5, "l": 170.8, "t": 1714622400000}
            ]
        }"#;
        let points = parse_aggregates(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].open, 169.5);
        assert_eq!(points[0].close, 171.2);
        assert_eq!(points[0].volume, 51234567);
        assert_eq!(points[0].timestamp.year(), 2024);
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn missing_results_is_empty_series() {
        let points = parse_aggregates(r#"{"status":"OK","resultsCount":0}"#).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn error_status_is_reported() {
        assert!(parse_aggregates(r#"{"status":"ERROR","error":"bad key"}"#).is_err());
        assert!(parse_aggregates("<html>").is_err());
    }
}
