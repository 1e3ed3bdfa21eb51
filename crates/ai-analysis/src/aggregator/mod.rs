//! 按股票聚合新闻情绪
//!
//! 每篇文章一个打分任务，经有界 worker pool 并发执行；
//! 失败或低置信度的文章不参与计算，最终归约为一个带交易建议的结论。

mod reduction;
mod summary;

use std::fmt;
use std::sync::Arc;

use dogonomics_workerpool::{run, task, Task, TaskContext, TaskError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::news_collector::Article;
use crate::sentiment_analyzer::{SentimentOutcome, SentimentScorer};

pub use reduction::{recommend, reduce};
pub use summary::{summarize, NewsSentimentSummary, SentimentCounts};

/// 参与计算的最低置信度
pub const MIN_CONFIDENCE: f64 = 0.1;

/// 推理并发默认值
pub const DEFAULT_CONCURRENCY: usize = 3;

/// 交易建议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Buy,
    WeakBuy,
    Hold,
    WeakSell,
    Sell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::WeakBuy => "WEAK_BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::WeakSell => "WEAK_SELL",
            Recommendation::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单只股票的情绪结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSentimentAnalysis {
    pub symbol: String,
    /// 加权情绪均值（-1.0 到 1.0）
    pub overall_sentiment: f64,
    pub confidence: f64,
    /// 原始文章数，包含被跳过的
    pub news_count: usize,
    pub positive_ratio: f64,
    pub neutral_ratio: f64,
    pub negative_ratio: f64,
    pub recommendation: Recommendation,
    /// 参与计算的文章数
    #[serde(default)]
    pub scored_count: usize,
    /// 打分失败、被取消或置信度过低的文章数
    #[serde(default)]
    pub skipped_count: usize,
}

impl StockSentimentAnalysis {
    /// 没有可用文章时的中性结论
    pub fn neutral(symbol: &str, news_count: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            overall_sentiment: 0.0,
            confidence: 0.0,
            news_count,
            positive_ratio: 0.0,
            neutral_ratio: 0.0,
            negative_ratio: 0.0,
            recommendation: Recommendation::Hold,
            scored_count: 0,
            skipped_count: news_count,
        }
    }
}

/// 单篇打分任务的输入，派发前构造好
struct ArticleJob {
    index: usize,
    title: String,
    body: String,
}

impl ArticleJob {
    fn into_task(
        self,
        scorer: Arc<dyn SentimentScorer>,
        outcomes: Arc<Mutex<Vec<Option<SentimentOutcome>>>>,
    ) -> Task {
        task(move |ctx: TaskContext| async move {
            // 打分器返回的字段是公开的，这里重新校验取值范围
            let checked = ctx
                .run_until_done(scorer.score(&self.title, &self.body))
                .await?
                .and_then(|o| SentimentOutcome::new(o.label, o.confidence, o.score));
            match checked {
                Ok(outcome) => {
                    outcomes.lock().await[self.index] = Some(outcome);
                    Ok(())
                }
                Err(e) => {
                    warn!("文章情绪打分失败: index={}, title={:?}, err={:#}", self.index, self.title, e);
                    Err(e)
                }
            }
        })
    }
}

/// 对一批文章做情绪分析并归约
///
/// 单篇失败不会让整批失败；打分结果（包括低置信度的）按下标回写到 `articles[i].sentiment`。
/// `concurrency` 为 0 属于误用，worker pool 会直接 panic。
pub async fn analyze(
    ctx: &TaskContext,
    symbol: &str,
    articles: &mut [Article],
    scorer: Arc<dyn SentimentScorer>,
    concurrency: usize,
) -> StockSentimentAnalysis {
    if articles.is_empty() {
        debug!("没有文章，直接返回中性结论: symbol={}", symbol);
        return StockSentimentAnalysis::neutral(symbol, 0);
    }

    let outcomes = Arc::new(Mutex::new(vec![None; articles.len()]));
    let tasks: Vec<Task> = articles
        .iter()
        .enumerate()
        .map(|(index, article)| {
            ArticleJob {
                index,
                title: article.title.clone(),
                body: article.body.clone(),
            }
            .into_task(Arc::clone(&scorer), Arc::clone(&outcomes))
        })
        .collect();

    let results = run(ctx, concurrency, tasks).await;

    let mut failed = 0;
    let mut cancelled = 0;
    for result in &results {
        match &result.error {
            None => {}
            Some(e) if e.is_cancellation() => cancelled += 1,
            Some(TaskError::Panicked(msg)) => {
                warn!("文章打分任务 panic: index={}, {}", result.index, msg);
                failed += 1;
            }
            Some(_) => failed += 1,
        }
    }

    let outcomes = outcomes.lock().await.clone();
    for (article, outcome) in articles.iter_mut().zip(outcomes.iter()) {
        if let Some(outcome) = outcome {
            article.sentiment = Some(*outcome);
        }
    }

    let verdict = reduce(symbol, &outcomes);
    if verdict.skipped_count > 0 {
        warn!(
            "情绪分析跳过部分文章: symbol={}, skipped={}, failed={}, cancelled={}, low_confidence={}",
            symbol,
            verdict.skipped_count,
            failed,
            cancelled,
            verdict.skipped_count.saturating_sub(failed + cancelled)
        );
    }
    info!(
        "情绪分析完成: symbol={}, news={}, scored={}, overall={:.3}, confidence={:.3}, recommendation={}",
        symbol,
        verdict.news_count,
        verdict.scored_count,
        verdict.overall_sentiment,
        verdict.confidence,
        verdict.recommendation
    );
    verdict
}

/// 持有打分器和并发度的聚合器
#[derive(Clone)]
pub struct SymbolSentimentAggregator {
    scorer: Arc<dyn SentimentScorer>,
    concurrency: usize,
}

impl SymbolSentimentAggregator {
    pub fn new(scorer: Arc<dyn SentimentScorer>) -> Self {
        Self {
            scorer,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// # Panics
    ///
    /// `concurrency` 为 0 时 panic
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        assert!(concurrency > 0, "sentiment concurrency must be at least 1");
        self.concurrency = concurrency;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn analyze(
        &self,
        ctx: &TaskContext,
        symbol: &str,
        articles: &mut [Article],
    ) -> StockSentimentAnalysis {
        analyze(ctx, symbol, articles, Arc::clone(&self.scorer), self.concurrency).await
    }
}
