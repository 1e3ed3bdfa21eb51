use serde::{Deserialize, Serialize};

use crate::news_collector::Article;
use crate::sentiment_analyzer::SentimentLabel;

/// 各标签的文章数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// 一批已打分文章的简单统计
///
/// 与 [`super::reduce`] 不同：不过滤低置信度，均值的分母是全部文章数（含未打分的）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSentimentSummary {
    pub average_score: f64,
    pub average_confidence: f64,
    pub sentiment_counts: SentimentCounts,
}

pub fn summarize(articles: &[Article]) -> NewsSentimentSummary {
    let mut summary = NewsSentimentSummary::default();
    if articles.is_empty() {
        return summary;
    }

    let mut total_score = 0.0;
    let mut total_confidence = 0.0;
    for outcome in articles.iter().filter_map(|a| a.sentiment.as_ref()) {
        total_score += outcome.score;
        total_confidence += outcome.confidence;
        match outcome.label {
            SentimentLabel::Positive => summary.sentiment_counts.positive += 1,
            SentimentLabel::Neutral => summary.sentiment_counts.neutral += 1,
            SentimentLabel::Negative => summary.sentiment_counts.negative += 1,
        }
    }

    let n = articles.len() as f64;
    summary.average_score = total_score / n;
    summary.average_confidence = total_confidence / n;
    summary
}
