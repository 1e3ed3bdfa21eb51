//! 新闻采集器
//!
//! 支持的新闻源：
//! - EODHD（按股票代码的公司新闻，按主题标签的市场新闻）
//! - Finnhub（公司新闻，按分类的市场新闻）
//!
//! [`MultiSourceCollector`] 并发查询所有已配置的新闻源并合并结果。

mod eodhd;
mod finnhub;
mod multi_source;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dogonomics_workerpool::TaskContext;
use serde::{Deserialize, Serialize};

use crate::sentiment_analyzer::SentimentOutcome;

pub use eodhd::{parse_eodhd_news, EodhdNewsCollector, EODHD_NEWS_URL};
pub use finnhub::{parse_finnhub_news, FinnhubNewsCollector, FINNHUB_NEWS_URL};
pub use multi_source::MultiSourceCollector;

/// 新闻数据模型
///
/// 聚合器只读取 `title` / `body`，打分完成后按下标回写 `sentiment`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentOutcome>,
}

impl Article {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// 新闻采集器接口
#[async_trait]
pub trait NewsCollector: Send + Sync {
    /// 拉取某只股票最近的新闻，最多 `limit` 条
    async fn collect_by_symbol(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>>;

    /// 拉取某个分类的市场综合新闻，最多 `limit` 条
    async fn collect_general(
        &self,
        ctx: &TaskContext,
        category: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_accepts_content_alias_and_missing_fields() {
        let article: Article =
            serde_json::from_str(r#"{"title": "Apple beats", "content": "Revenue up"}"#).unwrap();
        assert_eq!(article.body, "Revenue up");
        assert!(article.tags.is_empty());
        assert!(article.sentiment.is_none());
    }

    #[test]
    fn unscored_article_omits_sentiment() {
        let json = serde_json::to_string(&Article::new("t", "b")).unwrap();
        assert!(!json.contains("sentiment"));
    }
}
