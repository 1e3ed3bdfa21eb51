use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use dogonomics_workerpool::TaskContext;
use futures::future::join_all;
use tracing::warn;

use super::{Article, NewsCollector};

/// 多新闻源合并
///
/// 并发请求所有源，单个源失败只记日志；全部失败或都没有结果时才返回错误。
/// 合并顺序与注册顺序一致，最后截断到 `limit`。
pub struct MultiSourceCollector {
    sources: Vec<(String, Arc<dyn NewsCollector>)>,
}

impl MultiSourceCollector {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, name: impl Into<String>, source: Arc<dyn NewsCollector>) -> Self {
        self.sources.push((name.into(), source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn merge(
        &self,
        ctx: &TaskContext,
        batches: Vec<anyhow::Result<Vec<Article>>>,
        limit: usize,
        empty_message: String,
    ) -> anyhow::Result<Vec<Article>> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let mut merged = Vec::new();
        for ((name, _), batch) in self.sources.iter().zip(batches) {
            match batch {
                Ok(articles) => merged.extend(articles),
                Err(e) => warn!("新闻源请求失败: source={}, err={:#}", name, e),
            }
        }
        if merged.is_empty() {
            return Err(anyhow!(empty_message));
        }
        merged.truncate(limit);
        Ok(merged)
    }
}

impl Default for MultiSourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsCollector for MultiSourceCollector {
    async fn collect_by_symbol(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        let batches = join_all(
            self.sources
                .iter()
                .map(|(_, source)| source.collect_by_symbol(ctx, symbol, limit)),
        )
        .await;
        self.merge(
            ctx,
            batches,
            limit,
            format!("no news found for symbol {} from any source", symbol),
        )
    }

    async fn collect_general(
        &self,
        ctx: &TaskContext,
        category: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        let batches = join_all(
            self.sources
                .iter()
                .map(|(_, source)| source.collect_general(ctx, category, limit)),
        )
        .await;
        self.merge(
            ctx,
            batches,
            limit,
            "no news sources available or all sources failed".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogonomics_workerpool::ContextError;

    struct Fixed {
        prefix: &'static str,
        count: usize,
        fail: bool,
    }

    #[async_trait]
    impl NewsCollector for Fixed {
        async fn collect_by_symbol(
            &self,
            _ctx: &TaskContext,
            symbol: &str,
            limit: usize,
        ) -> anyhow::Result<Vec<Article>> {
            if self.fail {
                return Err(anyhow!("{} down", self.prefix));
            }
            Ok((0..self.count.min(limit))
                .map(|i| Article::new(format!("{} {} {}", self.prefix, symbol, i), ""))
                .collect())
        }

        async fn collect_general(
            &self,
            ctx: &TaskContext,
            category: &str,
            limit: usize,
        ) -> anyhow::Result<Vec<Article>> {
            self.collect_by_symbol(ctx, category, limit).await
        }
    }

    fn fixed(prefix: &'static str, count: usize, fail: bool) -> Arc<dyn NewsCollector> {
        Arc::new(Fixed {
            prefix,
            count,
            fail,
        })
    }

    #[tokio::test]
    async fn merges_in_registration_order_and_truncates() {
        let collector = MultiSourceCollector::new()
            .with_source("a", fixed("a", 2, false))
            .with_source("b", fixed("b", 3, false));

        let articles = collector
            .collect_general(&TaskContext::background(), "general", 4)
            .await
            .unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["a general 0", "a general 1", "b general 0", "b general 1"]
        );
    }

    #[tokio::test]
    async fn one_failing_source_is_tolerated() {
        let collector = MultiSourceCollector::new()
            .with_source("down", fixed("x", 0, true))
            .with_source("up", fixed("y", 2, false));

        let articles = collector
            .collect_by_symbol(&TaskContext::background(), "AAPL", 5)
            .await
            .unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn no_sources_or_all_failed_is_an_error() {
        let err = MultiSourceCollector::new()
            .collect_general(&TaskContext::background(), "general", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all sources failed"));

        let err = MultiSourceCollector::new()
            .with_source("down", fixed("x", 0, true))
            .collect_by_symbol(&TaskContext::background(), "TSLA", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TSLA"));
    }

    #[tokio::test]
    async fn cancelled_context_wins_over_partial_results() {
        let ctx = TaskContext::with_cancel(&TaskContext::background());
        ctx.cancel();
        let err = MultiSourceCollector::new()
            .with_source("up", fixed("y", 2, false))
            .collect_general(&ctx, "general", 5)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ContextError>(), Some(&ContextError::Canceled));
    }
}
