use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use super::{article_text, process_logits, SentimentLabel, SentimentOutcome, SentimentScorer};

/// 远程推理服务打分器
///
/// POST `{"text": "..."}` 到推理服务，响应可以是原始 logits
/// `{"logits": [neg, neu, pos]}`（也接受批量形式 `[[...]]`），
/// 也可以是已经算好的 `{"label", "confidence", "score"}`。
/// 网络错误、超时、429 和 5xx 会按指数退避重试。
pub struct HttpSentimentScorer {
    client: Client,
    endpoint: String,
    max_retries: usize,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogitsPayload {
    Flat(Vec<f32>),
    Batched(Vec<Vec<f32>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Logits {
        logits: LogitsPayload,
    },
    Outcome {
        label: String,
        confidence: f64,
        score: f64,
    },
}

enum RequestError {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

impl RequestError {
    fn is_transient(&self) -> bool {
        matches!(self, RequestError::Transient(_))
    }

    fn into_inner(self) -> anyhow::Error {
        match self {
            RequestError::Transient(e) | RequestError::Permanent(e) => e,
        }
    }
}

impl HttpSentimentScorer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build inference http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_retries: 2,
        })
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn request_once(&self, text: &str) -> Result<SentimentOutcome, RequestError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(
                serde_json::to_string(&InferenceRequest { text })
                    .map_err(|e| RequestError::Permanent(e.into()))?,
            )
            .send()
            .await
            .map_err(|e| RequestError::Transient(anyhow!("inference request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RequestError::Transient(anyhow!("failed to read inference response: {}", e)))?;

        if !status.is_success() {
            let err = anyhow!("inference service returned {}: {}", status, body);
            return if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                Err(RequestError::Transient(err))
            } else {
                Err(RequestError::Permanent(err))
            };
        }

        parse_inference_response(&body).map_err(RequestError::Permanent)
    }
}

/// 重试间隔：100ms、200ms、400ms ……，单次最多 2s
fn backoff(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(Duration::from_secs(2))
        .take(max_retries)
}

#[async_trait]
impl SentimentScorer for HttpSentimentScorer {
    async fn score(&self, title: &str, body: &str) -> anyhow::Result<SentimentOutcome> {
        let text = article_text(title, body);
        let strategy = backoff(self.max_retries).map(jitter);

        let outcome = RetryIf::spawn(
            strategy,
            || self.request_once(&text),
            |e: &RequestError| {
                if e.is_transient() {
                    warn!("推理请求失败，准备重试: {}", self.endpoint);
                }
                e.is_transient()
            },
        )
        .await
        .map_err(RequestError::into_inner)?;

        debug!(
            "推理完成: label={}, confidence={:.3}, score={:.3}",
            outcome.label, outcome.confidence, outcome.score
        );
        Ok(outcome)
    }
}

/// 解析推理服务响应
pub fn parse_inference_response(body: &str) -> anyhow::Result<SentimentOutcome> {
    let response: InferenceResponse =
        serde_json::from_str(body).context("unrecognized inference response")?;

    match response {
        InferenceResponse::Logits { logits } => {
            let logits = match logits {
                LogitsPayload::Flat(v) => v,
                LogitsPayload::Batched(mut rows) => {
                    if rows.is_empty() {
                        return Err(anyhow!("inference response has no logits rows"));
                    }
                    rows.swap_remove(0)
                }
            };
            if logits.len() < 3 {
                return Err(anyhow!(
                    "insufficient logits: got {}, expected at least 3",
                    logits.len()
                ));
            }
            Ok(process_logits(&logits))
        }
        InferenceResponse::Outcome {
            label,
            confidence,
            score,
        } => {
            let label: SentimentLabel = label.parse()?;
            SentimentOutcome::new(label, confidence, score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_logits() {
        let outcome = parse_inference_response(r#"{"logits": [-1.0, 0.0, 2.5]}"#).unwrap();
        assert_eq!(outcome.label, SentimentLabel::Positive);
        assert!(outcome.score > 0.0);
    }

    #[test]
    fn parses_batched_logits() {
        let outcome = parse_inference_response(r#"{"logits": [[3.0, 0.0, -1.0]]}"#).unwrap();
        assert_eq!(outcome.label, SentimentLabel::Negative);
    }

    #[test]
    fn parses_ready_outcome() {
        let outcome = parse_inference_response(
            r#"{"label": "Positive", "confidence": 0.91, "score": 0.8}"#,
        )
        .unwrap();
        assert_eq!(outcome.label, SentimentLabel::Positive);
        assert_eq!(outcome.confidence, 0.91);
    }

    #[test]
    fn rejects_short_logits_and_garbage() {
        assert!(parse_inference_response(r#"{"logits": [0.1, 0.2]}"#).is_err());
        assert!(parse_inference_response(r#"{"logits": []}"#).is_err());
        assert!(parse_inference_response(r#"{"label": "positive"}"#).is_err());
        assert!(parse_inference_response("not json").is_err());
    }

    #[test]
    fn backoff_doubles_from_100ms_and_caps_at_2s() {
        let delays: Vec<u64> = backoff(6).map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600, 2000]);
        assert_eq!(backoff(0).count(), 0);
    }

    #[test]
    fn rejects_out_of_range_outcome() {
        assert!(parse_inference_response(
            r#"{"label": "negative", "confidence": 3.0, "score": -0.5}"#
        )
        .is_err());
    }
}
