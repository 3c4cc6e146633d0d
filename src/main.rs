//! CogniActive desktop client: captures webcam frames, sends them to the
//! inference backend, and renders skeleton views plus motion metrics locally.
//!
//! Rキーで記録のトグル、Escで終了。

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use cogniactive_client::api::{HttpBackend, PoseBackend, RetryPolicy};
use cogniactive_client::camera::Webcam;
use cogniactive_client::config::Config;
use cogniactive_client::kinematics::{MotionMetrics, ReactionState};
use cogniactive_client::pipeline::{Pipeline, PipelineEvent};
use cogniactive_client::pose::PoseSnapshot;
use cogniactive_client::render::{project, Key, MinifbRenderer, MotionChart, Rect, ViewAngle};
use cogniactive_client::session::{SessionState, StatusBanner, StatusKind};

const GIT_VERSION: &str = env!("GIT_VERSION");

const WINDOW_WIDTH: usize = 900;
const WINDOW_HEIGHT: usize = 520;
const VIDEO_PANEL: Rect = Rect { x: 20, y: 20, w: 320, h: 240 };
const FRONT_PANEL: Rect = Rect { x: 360, y: 20, w: 240, h: 240 };
const SIDE_PANEL: Rect = Rect { x: 620, y: 20, w: 240, h: 240 };
const CHART_PANEL: Rect = Rect { x: 20, y: 280, w: 840, h: 220 };

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/client_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

// ---------------------------------------------------------------------------
// UI state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UiState {
    snapshot: Option<PoseSnapshot>,
    processed_jpeg: Option<Vec<u8>>,
    metrics: Option<MotionMetrics>,
    bpm: Option<f64>,
    banner: Option<StatusBanner>,
}

impl UiState {
    fn title(&self, session: &SessionState, now: Instant) -> String {
        let mut parts = vec![format!("CogniActive {}", GIT_VERSION)];

        if let Some(banner) = self.banner.as_ref().filter(|b| b.is_visible(now)) {
            parts.push(banner.message.clone());
        }
        if session.recording() {
            parts.push("REC".to_string());
        }
        if let Some(bpm) = self.bpm {
            if bpm > 0.0 {
                parts.push(format!("{:.0} bpm", bpm));
            }
        }
        if let Some(m) = &self.metrics {
            parts.push(format!("speed {:.1}", m.avg_speed));
            if let ReactionState::Detected { reaction_ms } = m.reaction {
                parts.push(format!("reaction {:.0} ms", reaction_ms));
            }
        }
        parts.join(" | ")
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let logfile = open_log_file()?;
    log!(logfile, "cogni-client {}", GIT_VERSION);

    let config = Config::load_or_default("config.toml");
    log!(logfile, "backend: {}", config.backend.base_url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let retry = RetryPolicy::from_config(&config.pipeline);
    let backend: Arc<dyn PoseBackend> = Arc::new(HttpBackend::new(&config.backend, retry)?);

    // バックエンド側のカメラと推論ワーカーを先に起こす
    runtime.block_on(async {
        backend.start_camera().await.context("start_camera")?;
        let resp = backend
            .start_processing()
            .await
            .context("start_processing")?;
        anyhow::Ok(resp.message)
    })
    .map(|message| log!(logfile, "backend ready: {}", message))?;

    // カメラが開けなければパイプラインは一切始めない
    let webcam = match Webcam::open(&config.camera) {
        Ok(w) => w,
        Err(e) => {
            log!(logfile, "camera unavailable: {e}");
            let _ = runtime.block_on(backend.stop_camera());
            return Err(e.into());
        }
    };

    let mut pipeline = Pipeline::spawn(config.clone(), webcam, Arc::clone(&backend));
    let mut renderer = MinifbRenderer::new("CogniActive", WINDOW_WIDTH, WINDOW_HEIGHT)?;

    let mut session = SessionState::new();
    session.start(Instant::now());
    let mut chart = MotionChart::default();
    let mut ui = UiState {
        banner: Some(StatusBanner::new("camera started", StatusKind::Active)),
        ..UiState::default()
    };

    while renderer.is_open() {
        while let Some(event) = pipeline.try_event() {
            handle_event(event, &mut ui, &mut session, &mut chart, &logfile);
        }

        if renderer.is_key_pressed(Key::R) {
            if session.recording() {
                pipeline.stop_recording();
            } else {
                pipeline.start_recording();
            }
        }

        renderer.clear();
        if let Some(jpeg) = &ui.processed_jpeg {
            if let Err(e) = renderer.draw_jpeg(jpeg, VIDEO_PANEL) {
                log!(logfile, "frame decode failed: {e}");
                ui.processed_jpeg = None;
            }
        }
        if let Some(snapshot) = &ui.snapshot {
            renderer.draw_skeleton(&project(snapshot, ViewAngle::Front), FRONT_PANEL);
            renderer.draw_skeleton(&project(snapshot, ViewAngle::Side), SIDE_PANEL);
        }
        renderer.draw_chart(&chart, CHART_PANEL);
        renderer.set_status(&ui.title(&session, Instant::now()));
        renderer.update()?;

        std::thread::sleep(Duration::from_millis(16));
    }

    // 描画を止めてからパイプライン、最後にバックエンドの順で畳む
    pipeline.stop();
    session.stop();
    if let Err(e) = runtime.block_on(backend.stop_camera()) {
        log!(logfile, "stop_camera failed: {e}");
    }
    log!(logfile, "shutdown complete");
    Ok(())
}

fn handle_event(
    event: PipelineEvent,
    ui: &mut UiState,
    session: &mut SessionState,
    chart: &mut MotionChart,
    logfile: &LogFile,
) {
    match event {
        PipelineEvent::Frame {
            snapshot,
            metrics,
            processed_jpeg,
            bpm,
            elapsed,
        } => {
            chart.push(&snapshot, elapsed);
            ui.snapshot = Some(snapshot);
            if processed_jpeg.is_some() {
                ui.processed_jpeg = processed_jpeg;
            }
            if let Some(m) = &metrics {
                if let ReactionState::Detected { reaction_ms } = m.reaction {
                    if !matches!(
                        ui.metrics.as_ref().map(|p| p.reaction),
                        Some(ReactionState::Detected { .. })
                    ) {
                        log!(logfile, "reaction detected: {:.0} ms", reaction_ms);
                    }
                }
            }
            ui.metrics = metrics;
            if bpm.is_some() {
                ui.bpm = bpm;
            }
        }
        PipelineEvent::Status(message) => {
            log!(logfile, "{}", message);
            ui.banner = Some(StatusBanner::new(message, StatusKind::Error));
        }
        PipelineEvent::HeartRate { bpm, detecting } => {
            if !detecting && bpm > 0.0 {
                ui.bpm = Some(bpm);
            }
        }
        PipelineEvent::RecordingStarted => {
            session.begin_recording();
            chart.reset();
            ui.banner = Some(StatusBanner::new("recording", StatusKind::Recording));
            log!(logfile, "recording started");
        }
        PipelineEvent::RecordingStopped {
            records,
            heart_rate,
        } => {
            session.end_recording();
            let message = match heart_rate {
                Some(hr) => format!("saved {} records (avg {:.0} bpm)", records, hr),
                None => format!("saved {} records", records),
            };
            log!(logfile, "{}", message);
            ui.banner = Some(StatusBanner::new(message, StatusKind::Info));
        }
    }
}
