//! Prediction API client.
//!
//! The prediction service speaks the upstream column naming (`ITEM_CD`,
//! `PROC_SEQ`, ...); the serde renames keep that at the wire boundary.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::error::RemoteError;

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub item_codes: Vec<String>,
    pub top_k: u32,
    pub similarity_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_weights: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_profile: Option<String>,
}

impl PredictRequest {
    pub fn new(item_codes: Vec<String>) -> Self {
        Self {
            item_codes,
            top_k: 5,
            similarity_threshold: 0.6,
            feature_weights: None,
            weight_profile: None,
        }
    }
}

/// One recommended operation for an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictedOperation {
    #[serde(rename = "PROC_SEQ")]
    pub proc_seq: i64,
    #[serde(rename = "PROC_CD")]
    pub proc_code: String,
    #[serde(rename = "PROC_DESC", default)]
    pub proc_desc: Option<String>,
    #[serde(rename = "SETUP_TIME", default)]
    pub setup_time: Option<f64>,
    #[serde(rename = "RUN_TIME", default)]
    pub run_time: Option<f64>,
    #[serde(rename = "WAIT_TIME", default)]
    pub wait_time: Option<f64>,
}

/// Recommendations for one item code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictedItem {
    #[serde(rename = "ITEM_CD")]
    pub item_code: String,
    #[serde(rename = "CANDIDATE_ID", default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub operations: Vec<PredictedOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub items: Vec<PredictedItem>,
    /// Candidate routings considered by the model, passed through untyped
    #[serde(default)]
    pub candidates: Value,
    /// Model quality metrics, passed through untyped
    #[serde(default)]
    pub metrics: Value,
}

/// Seam for the prediction service.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, RemoteError>;
}

/// HTTP client for the prediction service
pub struct HttpPredictionClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpPredictionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl PredictionApi for HttpPredictionClient {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, RemoteError> {
        let url = format!("{}/predict", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(RemoteError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(RemoteError::from_reqwest)?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| RemoteError::Payload(err.to_string()))
    }
}
