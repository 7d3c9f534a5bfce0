//! Bloom level prediction for a single question.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::labels::LabelMap;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Classifier API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Classifier returned no scores")]
    EmptyPrediction,

    #[error("Classifier returned unknown label '{0}'")]
    UnknownLabel(String),
}

#[async_trait]
pub trait BloomClassifier: Send + Sync {
    /// Score for every level the model knows, labelled with level codes.
    async fn label_scores(&self, question: &str) -> Result<Vec<LabelScore>, ClassifierError>;

    /// Predicted level code (`L1`..`L6`) for one question.
    async fn classify(&self, question: &str) -> Result<String, ClassifierError> {
        let scores = self.label_scores(question).await?;
        arg_max(&scores)
            .map(|best| best.label.clone())
            .ok_or(ClassifierError::EmptyPrediction)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Text-classification endpoints answer `[{..}]` or `[[{..}]]` depending on
/// the input shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Nested(mut outer) => {
                if outer.is_empty() {
                    Vec::new()
                } else {
                    outer.swap_remove(0)
                }
            }
            ClassificationResponse::Flat(scores) => scores,
        }
    }
}

/// Highest-scoring label. Ties go to the first one listed.
pub fn arg_max(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores.iter().fold(None, |best: Option<&LabelScore>, s| match best {
        Some(b) if b.score >= s.score => Some(b),
        _ => Some(s),
    })
}

/// Fine-tuned BERT classifier served by a hosted inference endpoint.
/// The endpoint truncates inputs to the model's 128-token window.
#[derive(Clone)]
pub struct HostedBloomClassifier {
    client: Client,
    url: String,
    api_token: String,
    labels: LabelMap,
}

impl HostedBloomClassifier {
    pub fn new(url: String, api_token: String, labels: LabelMap) -> Self {
        Self {
            client: Client::new(),
            url,
            api_token,
            labels,
        }
    }
}

#[async_trait]
impl BloomClassifier for HostedBloomClassifier {
    async fn label_scores(&self, question: &str) -> Result<Vec<LabelScore>, ClassifierError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "inputs": question,
                "parameters": {"truncation": true, "top_k": self.labels.labels().len()},
                "options": {"wait_for_model": true}
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<ClassificationResponse>()
            .await?
            .into_scores()
            .into_iter()
            .map(|s| match self.labels.resolve(&s.label) {
                Some(label) => Ok(LabelScore { label, score: s.score }),
                None => Err(ClassifierError::UnknownLabel(s.label)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn classifier(server: &MockServer) -> HostedBloomClassifier {
        HostedBloomClassifier::new(server.url("/bloom"), "hf".to_string(), LabelMap::default())
    }

    #[tokio::test]
    async fn test_nested_response_takes_arg_max() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bloom")
                .header("authorization", "Bearer hf")
                .body_contains("Define photosynthesis");
            then.status(200).json_body(json!([[
                {"label": "LABEL_3", "score": 0.2},
                {"label": "LABEL_0", "score": 0.7},
                {"label": "LABEL_5", "score": 0.1}
            ]]));
        });

        let level = classifier(&server).classify("Define photosynthesis").await.unwrap();
        assert_eq!(level, "L1");
        mock.assert();
    }

    #[tokio::test]
    async fn test_flat_response_with_direct_labels() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bloom");
            then.status(200).json_body(json!([
                {"label": "L5", "score": 0.9},
                {"label": "L2", "score": 0.1}
            ]));
        });

        let level = classifier(&server).classify("Justify your choice").await.unwrap();
        assert_eq!(level, "L5");
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bloom");
            then.status(503).body("loading");
        });

        let err = classifier(&server).classify("q").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_empty_scores_are_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bloom");
            then.status(200).json_body(json!([]));
        });

        let err = classifier(&server).classify("q").await.unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyPrediction));
    }

    #[tokio::test]
    async fn test_label_scores_are_resolved_to_levels() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bloom")
                .json_body_partial(r#"{"parameters": {"top_k": 6}}"#);
            then.status(200).json_body(json!([[
                {"label": "LABEL_0", "score": 0.6},
                {"label": "LABEL_4", "score": 0.4}
            ]]));
        });

        let scores = classifier(&server).label_scores("List the planets").await.unwrap();
        let labels: Vec<&str> = scores.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["L1", "L5"]);
        assert_eq!(scores[1].score, 0.4);
        mock.assert();
    }

    #[tokio::test]
    async fn test_unmapped_label_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bloom");
            then.status(200).json_body(json!([{"label": "LABEL_9", "score": 1.0}]));
        });

        let err = classifier(&server).classify("q").await.unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownLabel(l) if l == "LABEL_9"));
    }

    #[test]
    fn test_arg_max_prefers_first_on_ties() {
        let scores = vec![
            LabelScore { label: "a".into(), score: 0.5 },
            LabelScore { label: "b".into(), score: 0.5 },
        ];
        assert_eq!(arg_max(&scores).map(|s| s.label.as_str()), Some("a"));
    }
}
