use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use dogonomics_workerpool::TaskContext;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::models::{BasicFinancials, CompanyProfile, Quote};

pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub REST 客户端
pub struct FinnhubClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Finnhub http client")?;
        Ok(Self {
            client,
            api_key,
            base_url: FINNHUB_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, api_key: &str, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("token", api_key)])
            .query(params)
            .send()
            .await?;

        let status_code = response.status();
        let response_body = response.text().await?;
        debug!("path:{}, status:{}", endpoint, status_code);

        if status_code != StatusCode::OK {
            return Err(anyhow!(
                "API request failed with status: {}",
                status_code.as_u16()
            ));
        }
        Ok(response_body)
    }

    /// 发送 GET 请求并解析 JSON，请求与 `ctx` 赛跑
    pub(crate) async fn send_request<T: DeserializeOwned>(
        &self,
        ctx: &TaskContext,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("FINNHUB_API_KEY environment variable not set"))?;

        let body = ctx.run_until_done(self.get(api_key, endpoint, params)).await??;
        serde_json::from_str(&body).map_err(|e| {
            error!("解析 Finnhub 响应失败: path={}, err={}, body={}", endpoint, e, body);
            anyhow!("failed to parse {} response: {}", endpoint, e)
        })
    }

    pub async fn company_profile(&self, ctx: &TaskContext, symbol: &str) -> Result<CompanyProfile> {
        self.send_request(ctx, "/stock/profile2", &[("symbol", symbol)])
            .await
    }

    pub async fn quote(&self, ctx: &TaskContext, symbol: &str) -> Result<Quote> {
        self.send_request(ctx, "/quote", &[("symbol", symbol)]).await
    }

    pub async fn basic_financials(
        &self,
        ctx: &TaskContext,
        symbol: &str,
    ) -> Result<BasicFinancials> {
        self.send_request(ctx, "/stock/metric", &[("symbol", symbol), ("metric", "all")])
            .await
            .context("failed to get basic financials")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = FinnhubClient::new(None, Duration::from_secs(1)).unwrap();
        let err = client
            .quote(&TaskContext::background(), "AAPL")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("FINNHUB_API_KEY"));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let ctx = TaskContext::with_cancel(&TaskContext::background());
        ctx.cancel();
        let client = FinnhubClient::new(Some("k".into()), Duration::from_secs(30))
            .unwrap()
            .with_base_url("http://10.255.255.1/api/v1");
        let err = client.company_profile(&ctx, "AAPL").await.unwrap_err();
        assert!(err
            .downcast_ref::<dogonomics_workerpool::ContextError>()
            .is_some());
    }
}
