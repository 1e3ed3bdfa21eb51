use crate::sentiment_analyzer::{SentimentLabel, SentimentOutcome};

use super::{Recommendation, StockSentimentAnalysis, MIN_CONFIDENCE};

/// 把逐篇结果归约成一个结论
///
/// `outcomes[i]` 为 `None` 表示第 i 篇打分失败或被取消。
/// 只有置信度不低于 [`MIN_CONFIDENCE`] 的结果参与计算，`news_count` 始终是原始篇数。
pub fn reduce(symbol: &str, outcomes: &[Option<SentimentOutcome>]) -> StockSentimentAnalysis {
    let news_count = outcomes.len();
    let valid: Vec<&SentimentOutcome> = outcomes
        .iter()
        .flatten()
        .filter(|o| o.confidence >= MIN_CONFIDENCE)
        .collect();

    if valid.is_empty() {
        return StockSentimentAnalysis::neutral(symbol, news_count);
    }

    let n = valid.len() as f64;
    let overall_sentiment = valid.iter().map(|o| o.weighted()).sum::<f64>() / n;
    let confidence = valid.iter().map(|o| o.confidence).sum::<f64>() / n;

    let count = |label: SentimentLabel| valid.iter().filter(|o| o.label == label).count() as f64;
    let positive_ratio = count(SentimentLabel::Positive) / n;
    let neutral_ratio = count(SentimentLabel::Neutral) / n;
    let negative_ratio = count(SentimentLabel::Negative) / n;

    StockSentimentAnalysis {
        symbol: symbol.to_string(),
        overall_sentiment,
        confidence,
        news_count,
        positive_ratio,
        neutral_ratio,
        negative_ratio,
        recommendation: recommend(overall_sentiment, confidence, positive_ratio, negative_ratio),
        scored_count: valid.len(),
        skipped_count: news_count - valid.len(),
    }
}

/// 按固定顺序匹配阈值，先命中者为准
pub fn recommend(
    overall_sentiment: f64,
    confidence: f64,
    positive_ratio: f64,
    negative_ratio: f64,
) -> Recommendation {
    if confidence < 0.6 {
        Recommendation::Hold
    } else if overall_sentiment > 0.3 && positive_ratio > 0.6 {
        Recommendation::Buy
    } else if overall_sentiment < -0.3 && negative_ratio > 0.6 {
        Recommendation::Sell
    } else if overall_sentiment > 0.1 && positive_ratio > negative_ratio {
        Recommendation::WeakBuy
    } else if overall_sentiment < -0.1 && negative_ratio > positive_ratio {
        Recommendation::WeakSell
    } else {
        Recommendation::Hold
    }
}
