use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dogonomics_workerpool::TaskContext;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Article, NewsCollector};

pub const FINNHUB_NEWS_URL: &str = "https://finnhub.io/api/v1";

/// 公司新闻回看天数
const COMPANY_NEWS_DAYS: i64 = 7;

/// Finnhub 新闻采集器（公司新闻 + 市场综合新闻）
pub struct FinnhubNewsCollector {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct FinnhubItem {
    #[serde(default)]
    category: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    related: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

impl FinnhubNewsCollector {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Finnhub news http client")?;
        Ok(Self {
            client,
            api_key,
            base_url: FINNHUB_NEWS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Finnhub API key not configured"))
    }

    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("token", self.api_key()?)])
            .send()
            .await
            .context("failed to fetch Finnhub news")?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(anyhow!("Finnhub API error: {} - {}", status, body));
        }
        Ok(body)
    }
}

#[async_trait]
impl NewsCollector for FinnhubNewsCollector {
    async fn collect_by_symbol(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        self.api_key()?;
        let today = Utc::now().date_naive();
        let from = (today - chrono::Duration::days(COMPANY_NEWS_DAYS)).to_string();
        let to = today.to_string();

        debug!("拉取 Finnhub 公司新闻: symbol={}, from={}, to={}", symbol, from, to);
        let body = ctx
            .run_until_done(self.fetch(
                "/company-news",
                &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
            ))
            .await??;
        let articles = parse_finnhub_news(&body, limit)?;
        info!("Finnhub 公司新闻拉取完成: symbol={}, count={}", symbol, articles.len());
        Ok(articles)
    }

    async fn collect_general(
        &self,
        ctx: &TaskContext,
        category: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        self.api_key()?;
        let category = if category.trim().is_empty() {
            "general"
        } else {
            category.trim()
        };

        debug!("拉取 Finnhub 市场新闻: category={}, limit={}", category, limit);
        let body = ctx
            .run_until_done(self.fetch("/news", &[("category", category)]))
            .await??;
        let articles = parse_finnhub_news(&body, limit)?;
        info!("Finnhub 市场新闻拉取完成: category={}, count={}", category, articles.len());
        Ok(articles)
    }
}

/// 解析 Finnhub 新闻列表，最多保留 `limit` 条
pub fn parse_finnhub_news(body: &str, limit: usize) -> anyhow::Result<Vec<Article>> {
    let items: Vec<FinnhubItem> =
        serde_json::from_str(body).context("failed to decode Finnhub response")?;

    Ok(items
        .into_iter()
        .take(limit)
        .map(|item| {
            let tags = if item.category.is_empty() {
                Vec::new()
            } else {
                vec![item.category]
            };
            Article {
                title: item.headline,
                body: item.summary,
                symbols: item
                    .related
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                link: item.url,
                source: format!("Finnhub ({})", item.source),
                published_at: Utc.timestamp_opt(item.datetime, 0).single(),
                ..Default::default()
            }
            .with_tags(tags)
        })
        .collect())
}
