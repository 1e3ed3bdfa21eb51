use super::{SentimentLabel, SentimentOutcome};

/// FinBERT 输出的类别顺序
const LABELS: [SentimentLabel; 3] = [
    SentimentLabel::Negative,
    SentimentLabel::Neutral,
    SentimentLabel::Positive,
];

/// 把三分类 logits 转成情绪结果
///
/// softmax 之后取概率最大的类别作为标签、最大概率作为置信度，
/// 分数为 正面概率 - 负面概率。不足三个 logit 时返回零置信度的中性结果。
pub fn process_logits(logits: &[f32]) -> SentimentOutcome {
    if logits.len() < 3 {
        return SentimentOutcome {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            score: 0.0,
        };
    }

    let logits = &logits[..3];
    // 减去最大值保证 exp 不溢出
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits
        .iter()
        .map(|&l| f64::from(l - max_logit).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    let probs: Vec<f64> = exps.iter().map(|e| e / sum).collect();

    let mut best = 0;
    for i in 1..probs.len() {
        if probs[i] > probs[best] {
            best = i;
        }
    }

    SentimentOutcome {
        label: LABELS[best],
        confidence: probs[best],
        score: probs[2] - probs[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn short_logits_are_neutral_with_zero_confidence() {
        let outcome = process_logits(&[1.0, 2.0]);
        assert_eq!(outcome.label, SentimentLabel::Neutral);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn equal_logits_give_uniform_probabilities() {
        let outcome = process_logits(&[0.5, 0.5, 0.5]);
        // 并列时取第一个类别
        assert_eq!(outcome.label, SentimentLabel::Negative);
        assert_abs_diff_eq!(outcome.confidence, 1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.score, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn strong_positive_logit() {
        let outcome = process_logits(&[-2.0, 0.0, 3.0]);
        assert_eq!(outcome.label, SentimentLabel::Positive);
        let e = [(-5.0f64).exp(), (-3.0f64).exp(), 1.0];
        let sum: f64 = e.iter().sum();
        assert_abs_diff_eq!(outcome.confidence, 1.0 / sum, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.score, (e[2] - e[0]) / sum, epsilon = 1e-6);
    }

    #[test]
    fn large_logits_do_not_overflow() {
        let outcome = process_logits(&[1000.0, 0.0, -1000.0]);
        assert_eq!(outcome.label, SentimentLabel::Negative);
        assert_abs_diff_eq!(outcome.confidence, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.score, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn extra_logits_are_ignored() {
        let a = process_logits(&[0.1, 0.2, 0.3]);
        let b = process_logits(&[0.1, 0.2, 0.3, 99.0]);
        assert_eq!(a, b);
    }
}
