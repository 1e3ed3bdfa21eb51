use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use dogonomics_workerpool::TaskContext;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Article, NewsCollector};

pub const EODHD_NEWS_URL: &str = "https://eodhd.com/api/news";

/// EODHD 新闻采集器
pub struct EodhdNewsCollector {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// EODHD 的 `symbols` / `tags` 有时是数组，有时是逗号分隔的字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl Default for StringList {
    fn default() -> Self {
        StringList::List(Vec::new())
    }
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringList::List(v) => v,
            StringList::Joined(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct EodhdItem {
    #[serde(default)]
    date: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    symbols: StringList,
    #[serde(default)]
    tags: StringList,
}

impl EodhdNewsCollector {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build EODHD http client")?;
        Ok(Self {
            client,
            api_key,
            base_url: EODHD_NEWS_URL.to_string(),
        })
    }

    /// 替换接口地址（测试或代理）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("EODHD API key not configured"))
    }

    /// `filter` 为 `("s", 股票代码)` 或 `("t", 主题标签)`
    async fn fetch(&self, filter: (&str, &str), limit: usize) -> anyhow::Result<String> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_token", self.api_key()?),
                filter,
                ("limit", limit.as_str()),
                ("fmt", "json"),
            ])
            .send()
            .await
            .context("failed to fetch EODHD news")?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(anyhow!("EODHD API error: {} - {}", status, body));
        }
        Ok(body)
    }
}

#[async_trait]
impl NewsCollector for EodhdNewsCollector {
    async fn collect_by_symbol(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        self.api_key()?;

        debug!("拉取 EODHD 新闻: symbol={}, limit={}", symbol, limit);
        let body = ctx.run_until_done(self.fetch(("s", symbol), limit)).await??;
        let articles = parse_eodhd_news(&body, limit)?;
        info!("EODHD 新闻拉取完成: symbol={}, count={}", symbol, articles.len());
        Ok(articles)
    }

    /// EODHD 没有分类接口，按主题标签过滤
    async fn collect_general(
        &self,
        ctx: &TaskContext,
        category: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        self.api_key()?;

        debug!("拉取 EODHD 主题新闻: tag={}, limit={}", category, limit);
        let body = ctx.run_until_done(self.fetch(("t", category), limit)).await??;
        let articles = parse_eodhd_news(&body, limit)?;
        info!("EODHD 主题新闻拉取完成: tag={}, count={}", category, articles.len());
        Ok(articles)
    }
}

/// 解析 EODHD 新闻响应，最多保留 `limit` 条
pub fn parse_eodhd_news(body: &str, limit: usize) -> anyhow::Result<Vec<Article>> {
    let items: Vec<EodhdItem> =
        serde_json::from_str(body).context("failed to decode EODHD response")?;

    Ok(items
        .into_iter()
        .take(limit)
        .map(|item| Article {
            title: item.title,
            body: item.content,
            tags: item.tags.into_vec(),
            symbols: item.symbols.into_vec(),
            link: item.link,
            source: "EODHD".to_string(),
            published_at: parse_date(&item.date),
            sentiment: None,
        })
        .collect())
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SAMPLE: &str = r#"[
        {
            "date": "2024-05-02T20:30:00+00:00",
            "title": "Apple beats estimates",
            "content": "Revenue rose 15% year over year.",
            "link": "https://example.com/a",
            "symbols": ["AAPL.US", "MSFT.US"],
            "tags": ["EARNINGS"]
        },
        {
            "date": "2024-05-01 09:15:00",
            "title": "Supply chain concerns",
            "content": "Analysts flag risks.",
            "link": "https://example.com/b",
            "symbols": "AAPL.US, TSM.US"
        },
        {
            "date": "garbage",
            "title": "Third",
            "content": "Body"
        }
    ]"#;

    #[test]
    fn maps_items_to_articles() {
        let articles = parse_eodhd_news(SAMPLE, 10).unwrap();
        assert_eq!(articles.len(), 3);

        let first = &articles[0];
        assert_eq!(first.title, "Apple beats estimates");
        assert_eq!(first.body, "Revenue rose 15% year over year.");
        assert_eq!(first.symbols, vec!["AAPL.US", "MSFT.US"]);
        assert_eq!(first.tags, vec!["EARNINGS"]);
        assert_eq!(first.source, "EODHD");
        let published = first.published_at.unwrap();
        assert_eq!((published.year(), published.month(), published.day()), (2024, 5, 2));
        assert_eq!(published.hour(), 20);

        assert_eq!(articles[1].symbols, vec!["AAPL.US", "TSM.US"]);
        assert!(articles[1].published_at.is_some());
        assert!(articles[2].published_at.is_none());
    }

    #[test]
    fn respects_limit() {
        let articles = parse_eodhd_news(SAMPLE, 2).unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[test]
    fn rejects_non_array_body() {
        assert!(parse_eodhd_news(r#"{"error": "bad token"}"#, 5).is_err());
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error() {
        let collector = EodhdNewsCollector::new(None, Duration::from_secs(1)).unwrap();
        let err = collector
            .collect_by_symbol(&TaskContext::background(), "AAPL", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn cancelled_context_aborts_request() {
        let ctx = TaskContext::background();
        let child = TaskContext::with_cancel(&ctx);
        child.cancel();
        // 不可路由地址，只有取消能让请求立即返回
        let collector = EodhdNewsCollector::new(Some("k".into()), Duration::from_secs(30))
            .unwrap()
            .with_base_url("http://10.255.255.1/api/news");
        let err = collector.collect_by_symbol(&child, "AAPL", 5).await.unwrap_err();
        assert!(err.downcast_ref::<dogonomics_workerpool::ContextError>().is_some());
    }
}
