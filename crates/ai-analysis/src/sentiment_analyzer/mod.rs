//! 情绪分析器
//!
//! 单篇文章的情绪打分能力。推理引擎本身（分词、模型执行）在服务外部，
//! 这里只约定输入输出：给定标题和正文，返回 标签 / 置信度 / 分数。

mod http_scorer;
mod logits;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, ensure};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub use http_scorer::{parse_inference_response, HttpSentimentScorer};
pub use logits::process_logits;

/// 送入模型的最大字符数（BERT 有 token 上限，标题更重要所以放在前面）
pub const MAX_ARTICLE_CHARS: usize = 1000;

/// 情绪标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "bullish" => Ok(SentimentLabel::Positive),
            "neutral" | "neu" => Ok(SentimentLabel::Neutral),
            "negative" | "neg" | "bearish" => Ok(SentimentLabel::Negative),
            other => Err(anyhow!("unknown sentiment label: {}", other)),
        }
    }
}

/// 单篇文章的情绪结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentOutcome {
    pub label: SentimentLabel,
    /// 置信度（0.0 到 1.0）
    pub confidence: f64,
    /// 情绪分数（-1.0 极度悲观，1.0 极度乐观）
    pub score: f64,
}

impl SentimentOutcome {
    /// 构造并校验取值范围
    pub fn new(label: SentimentLabel, confidence: f64, score: f64) -> anyhow::Result<Self> {
        ensure!(
            confidence.is_finite() && (0.0..=1.0).contains(&confidence),
            "confidence out of range: {}",
            confidence
        );
        ensure!(
            score.is_finite() && (-1.0..=1.0).contains(&score),
            "score out of range: {}",
            score
        );
        Ok(Self {
            label,
            confidence,
            score,
        })
    }

    /// 置信度与分数相乘后的加权情绪
    pub fn weighted(&self) -> f64 {
        self.score * self.confidence
    }
}

/// 情绪打分接口
///
/// 实现必须可以被多个 worker 并发调用；底层引擎不支持并发时用
/// [`SerializedScorer`] 包一层。
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, title: &str, body: &str) -> anyhow::Result<SentimentOutcome>;
}

/// 串行化包装：同一时刻只允许一次推理
pub struct SerializedScorer<S> {
    inner: S,
    inference: Mutex<()>,
}

impl<S: SentimentScorer> SerializedScorer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            inference: Mutex::new(()),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: SentimentScorer> SentimentScorer for SerializedScorer<S> {
    async fn score(&self, title: &str, body: &str) -> anyhow::Result<SentimentOutcome> {
        let _guard = self.inference.lock().await;
        self.inner.score(title, body).await
    }
}

/// 拼接标题与正文作为模型输入，超长时按字符截断并加 `...`
pub fn article_text(title: &str, body: &str) -> String {
    let full = format!("{}. {}", title.trim(), body.trim());
    if full.chars().count() <= MAX_ARTICLE_CHARS {
        return full;
    }
    let mut truncated: String = full.chars().take(MAX_ARTICLE_CHARS).collect();
    truncated.push_str("...");
    truncated
}
