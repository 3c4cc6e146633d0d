use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub features: FeatureConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// 推論バックエンドのベースURL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// リクエストタイムアウト（ミリ秒）
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    /// キャプチャ解像度
    #[serde(default = "default_capture_width")]
    pub width: u32,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    /// 送信解像度（帯域節約のため縮小）
    #[serde(default = "default_send_width")]
    pub send_width: u32,
    #[serde(default = "default_send_height")]
    pub send_height: u32,
    /// JPEG品質 (0-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// フレーム送信間隔（ミリ秒）
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// 送信リトライ回数の上限
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// リトライ間の待ち時間（ミリ秒）
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_queue_poll_secs")]
    pub queue_poll_secs: u64,
    /// キュー深度がこれを超えたら警告
    #[serde(default = "default_queue_warn_depth")]
    pub queue_warn_depth: usize,
    #[serde(default = "default_heart_rate_poll_secs")]
    pub heart_rate_poll_secs: u64,
}

/// Empirical constants for the coaching heuristics. Thresholds are in scaled
/// speed units (see `speed_scale`); no documented derivation exists, so they
/// stay configurable rather than hard-coded.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    /// 平均速度を取る直近サンプル数
    #[serde(default = "default_avg_window")]
    pub avg_window: usize,
    /// ベースライン確立に必要なフレーム数
    #[serde(default = "default_baseline_frames")]
    pub baseline_frames: u32,
    #[serde(default = "default_rise_threshold")]
    pub rise_threshold: f64,
    #[serde(default = "default_fall_threshold")]
    pub fall_threshold: f64,
    #[serde(default = "default_quick_move_threshold")]
    pub quick_move_threshold: f64,
    /// 正規化座標の速度は小さいので表示用に拡大する
    #[serde(default = "default_speed_scale")]
    pub speed_scale: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureConfig {
    /// 心拍数ポーリングを有効にする
    #[serde(default = "default_true")]
    pub heart_rate: bool,
    /// キュー深度の診断ポーリングを有効にする
    #[serde(default = "default_true")]
    pub queue_monitor: bool,
}

fn default_base_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_request_timeout_ms() -> u64 { 5000 }
fn default_capture_width() -> u32 { 640 }
fn default_capture_height() -> u32 { 480 }
fn default_send_width() -> u32 { 320 }
fn default_send_height() -> u32 { 240 }
fn default_jpeg_quality() -> i32 { 60 }
fn default_frame_interval_ms() -> u64 { 200 }
fn default_retry_max_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 100 }
fn default_queue_poll_secs() -> u64 { 5 }
fn default_queue_warn_depth() -> usize { 2 }
fn default_heart_rate_poll_secs() -> u64 { 2 }
fn default_history_cap() -> usize { 100 }
fn default_avg_window() -> usize { 50 }
fn default_baseline_frames() -> u32 { 30 }
fn default_rise_threshold() -> f64 { 1.5 }
fn default_fall_threshold() -> f64 { 0.5 }
fn default_quick_move_threshold() -> f64 { 2.0 }
fn default_speed_scale() -> f64 { 100.0 }
fn default_true() -> bool { true }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: default_capture_width(),
            height: default_capture_height(),
            send_width: default_send_width(),
            send_height: default_send_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            queue_poll_secs: default_queue_poll_secs(),
            queue_warn_depth: default_queue_warn_depth(),
            heart_rate_poll_secs: default_heart_rate_poll_secs(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            avg_window: default_avg_window(),
            baseline_frames: default_baseline_frames(),
            rise_threshold: default_rise_threshold(),
            fall_threshold: default_fall_threshold(),
            quick_move_threshold: default_quick_move_threshold(),
            speed_scale: default_speed_scale(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            heart_rate: true,
            queue_monitor: true,
        }
    }
}

impl PipelineConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読めなければデフォルト設定で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!(
                    "[config] {} not loaded ({e}), using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.frame_interval_ms, 200);
        assert_eq!(config.pipeline.retry_max_attempts, 3);
        assert_eq!(config.analysis.history_cap, 100);
        assert_eq!(config.analysis.baseline_frames, 30);
        assert!(config.features.heart_rate);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            frame_interval_ms = 100

            [analysis]
            rise_threshold = 2.5

            [features]
            heart_rate = false
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.frame_interval_ms, 100);
        assert_eq!(config.pipeline.retry_delay_ms, 100);
        assert_eq!(config.analysis.rise_threshold, 2.5);
        assert_eq!(config.analysis.fall_threshold, 0.5);
        assert!(!config.features.heart_rate);
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.pipeline.frame_interval(), Duration::from_millis(200));
        assert_eq!(config.pipeline.retry_delay(), Duration::from_millis(100));
    }
}
