//! HTTP wire contract with the CogniActive inference backend.
//!
//! Field names and shapes must stay exactly as the backend emits them; there
//! is no versioning or schema negotiation on this interface.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BackendConfig, PipelineConfig};
use crate::pose::{Landmark, PoseSnapshot};

// --- Message types ---

#[derive(Debug, Serialize)]
pub struct ProcessFrameRequest<'a> {
    /// base64 JPEG data URL
    pub image: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameResponse {
    pub status: String,
    /// Processed frame with the skeleton drawn in, as a data URL
    pub image: Option<String>,
    pub landmarks: Option<Vec<Landmark>>,
    pub bpm: Option<f64>,
}

impl FrameResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// ランドマークを33点のスナップショットとして取り出す。
    /// 点数が合わない応答はNone（そのフレームは捨てる）。
    pub fn snapshot(&self) -> Option<PoseSnapshot> {
        self.landmarks
            .clone()
            .and_then(PoseSnapshot::from_landmarks)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartProcessingResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub records: u64,
    pub heart_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub frame_queue_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartRateResponse {
    pub status: String,
    pub bpm: f64,
    pub detecting: bool,
}

// --- Errors ---

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx from the backend. Eligible for retry.
    #[error("backend returned HTTP {0}")]
    Status(StatusCode),
    /// Network-level failure (connect, timeout, ...). Eligible for retry.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Body did not match the expected shape. Not retried; the frame is lost.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Status(_) | ApiError::Transport(_))
    }
}

// --- Bounded retry ---

/// Fixed-delay bounded retry. Worst-case latency is
/// `(max_attempts + 1) * request_timeout + max_attempts * delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            delay: config.retry_delay(),
        }
    }
}

/// Run `op`, resubmitting after a fixed delay on retryable failures, up to
/// `max_attempts` resubmissions. The last error is surfaced once attempts are
/// exhausted; non-retryable errors propagate immediately.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                attempt += 1;
                eprintln!(
                    "[api] retry attempt {}/{} ({e})",
                    attempt, policy.max_attempts
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

// --- Backend trait ---

/// The eight endpoints this front-end relies on. Mocked in pipeline tests.
#[async_trait]
pub trait PoseBackend: Send + Sync + 'static {
    async fn start_camera(&self) -> Result<StatusResponse, ApiError>;
    async fn stop_camera(&self) -> Result<StatusResponse, ApiError>;
    async fn start_processing(&self) -> Result<StartProcessingResponse, ApiError>;
    /// One frame round-trip. `image` is a base64 JPEG data URL.
    async fn process_frame(&self, image: &str) -> Result<FrameResponse, ApiError>;
    async fn start_recording(&self) -> Result<StatusResponse, ApiError>;
    async fn stop_recording(&self) -> Result<StopRecordingResponse, ApiError>;
    async fn queue_status(&self) -> Result<QueueStatus, ApiError>;
    async fn heart_rate(&self) -> Result<HeartRateResponse, ApiError>;
}

// --- reqwest implementation ---

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.client.get(self.url(path)).send().await?;
        decode(resp).await
    }

    async fn post_json<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + Sync,
    {
        let mut req = self.client.post(self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        decode(resp).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status(status));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Malformed(e.to_string()))
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl PoseBackend for HttpBackend {
    async fn start_camera(&self) -> Result<StatusResponse, ApiError> {
        self.post_json("start_camera", NO_BODY).await
    }

    async fn stop_camera(&self) -> Result<StatusResponse, ApiError> {
        self.post_json("stop_camera", NO_BODY).await
    }

    async fn start_processing(&self) -> Result<StartProcessingResponse, ApiError> {
        self.post_json("start_processing", NO_BODY).await
    }

    async fn process_frame(&self, image: &str) -> Result<FrameResponse, ApiError> {
        let retry = self.retry;
        with_retry(retry, || async move {
            self.post_json("process_frame", Some(&ProcessFrameRequest { image }))
                .await
        })
        .await
    }

    async fn start_recording(&self) -> Result<StatusResponse, ApiError> {
        self.post_json("start_recording", NO_BODY).await
    }

    async fn stop_recording(&self) -> Result<StopRecordingResponse, ApiError> {
        self.post_json("stop_recording", NO_BODY).await
    }

    async fn queue_status(&self) -> Result<QueueStatus, ApiError> {
        self.get_json("queue_status").await
    }

    async fn heart_rate(&self) -> Result<HeartRateResponse, ApiError> {
        self.get_json("get_heart_rate").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = Arc::clone(&calls);
        let start = tokio::time::Instant::now();

        let result: Result<(), ApiError> = with_retry(policy(3, 100), || {
            let calls = Arc::clone(&calls_ref);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Status(StatusCode::BAD_GATEWAY))
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Status(_))));
        // 1 initial attempt + 3 resubmissions
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // fixed delay between attempts
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = Arc::clone(&calls);

        let result = with_retry(policy(3, 100), || {
            let calls = Arc::clone(&calls_ref);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ApiError::Status(StatusCode::SERVICE_UNAVAILABLE))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = Arc::clone(&calls);

        let result: Result<(), ApiError> = with_retry(policy(3, 100), || {
            let calls = Arc::clone(&calls_ref);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Malformed("missing field `status`".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Malformed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frame_response_shape() {
        let json = r#"{
            "status": "success",
            "image": "data:image/jpeg;base64,/9j/4AAQ",
            "landmarks": [{"x": 0.5, "y": 0.5, "z": -0.1}],
            "bpm": 72.0
        }"#;
        let resp: FrameResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.bpm, Some(72.0));
        // only one landmark: not a valid 33-point snapshot
        assert!(resp.snapshot().is_none());
    }

    #[test]
    fn test_frame_response_processing_shape() {
        let json = r#"{"status": "processing", "message": "busy", "bpm": 0}"#;
        let resp: FrameResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_success());
        assert!(resp.image.is_none());
        assert!(resp.landmarks.is_none());
    }

    #[test]
    fn test_full_snapshot_roundtrip() {
        let landmarks: Vec<String> = (0..33)
            .map(|i| format!(r#"{{"x": 0.1, "y": 0.2, "z": {}}}"#, i as f64 * 0.01))
            .collect();
        let json = format!(
            r#"{{"status": "success", "landmarks": [{}]}}"#,
            landmarks.join(",")
        );
        let resp: FrameResponse = serde_json::from_str(&json).unwrap();
        let snapshot = resp.snapshot().unwrap();
        assert_eq!(snapshot.landmarks().len(), 33);
    }

    #[test]
    fn test_misc_response_shapes() {
        let q: QueueStatus = serde_json::from_str(r#"{"frame_queue_size": 3}"#).unwrap();
        assert_eq!(q.frame_queue_size, 3);

        let hr: HeartRateResponse =
            serde_json::from_str(r#"{"status": "success", "bpm": 64.5, "detecting": false}"#)
                .unwrap();
        assert_eq!(hr.bpm, 64.5);
        assert!(!hr.detecting);

        let sr: StopRecordingResponse =
            serde_json::from_str(r#"{"status": "success", "records": 120, "heart_rate": 71.2}"#)
                .unwrap();
        assert_eq!(sr.records, 120);
        assert_eq!(sr.heart_rate, Some(71.2));

        let sr: StopRecordingResponse =
            serde_json::from_str(r#"{"status": "success", "records": 0}"#).unwrap();
        assert_eq!(sr.heart_rate, None);
    }
}
