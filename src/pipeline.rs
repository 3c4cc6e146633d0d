//! フレーム取得→送信→解析のパイプライン。
//!
//! 固定周期でフレームを採取するが、送信は常に最大1件だけ（single-flight）。
//! バックエンドが遅いあいだの周期は黙ってスキップし、リクエストを積み上げない。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::PoseBackend;
use crate::camera::{decode_data_url, FrameSource};
use crate::config::Config;
use crate::kinematics::{MotionAnalyzer, MotionMetrics};
use crate::pose::PoseSnapshot;

/// パイプラインからUIへ流れるイベント
#[derive(Debug)]
pub enum PipelineEvent {
    /// 1フレーム分の解析結果
    Frame {
        snapshot: PoseSnapshot,
        metrics: Option<MotionMetrics>,
        /// バックエンドが骨格を描き込んだJPEG
        processed_jpeg: Option<Vec<u8>>,
        bpm: Option<f64>,
        /// パイプライン開始からの経過秒
        elapsed: f64,
    },
    /// バナー表示向けのメッセージ
    Status(String),
    HeartRate {
        bpm: f64,
        detecting: bool,
    },
    RecordingStarted,
    RecordingStopped {
        records: u64,
        heart_rate: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum PipelineCommand {
    StartRecording,
    StopRecording,
}

/// 同時送信を1件に抑える簡易ガード。獲得できたらDropで返す。
#[derive(Clone, Default)]
struct SingleFlight(Arc<AtomicBool>);

struct FlightGuard(Arc<AtomicBool>);

impl SingleFlight {
    fn try_acquire(&self) -> Option<FlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(Arc::clone(&self.0)))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 稼働中パイプラインへのハンドル
pub struct Pipeline {
    events: mpsc::Receiver<PipelineEvent>,
    commands: mpsc::Sender<PipelineCommand>,
    token: CancellationToken,
}

impl Pipeline {
    /// パイプラインを起動する。tokioランタイム上で呼ぶこと。
    pub fn spawn<S: FrameSource>(
        config: Config,
        source: S,
        backend: Arc<dyn PoseBackend>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (command_tx, command_rx) = mpsc::channel(8);
        let token = CancellationToken::new();

        tokio::spawn(run(
            config,
            source,
            backend,
            event_tx,
            command_rx,
            token.clone(),
        ));

        Self {
            events: event_rx,
            commands: command_tx,
            token,
        }
    }

    /// ノンブロッキングでイベントを取り出す（描画ループ用）
    pub fn try_event(&mut self) -> Option<PipelineEvent> {
        self.events.try_recv().ok()
    }

    pub async fn recv_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    pub fn start_recording(&self) {
        self.send(PipelineCommand::StartRecording);
    }

    pub fn stop_recording(&self) {
        self.send(PipelineCommand::StopRecording);
    }

    fn send(&self, command: PipelineCommand) {
        if self.commands.try_send(command).is_err() {
            eprintln!("[pipeline] command dropped: {command:?}");
        }
    }

    /// 停止を要求する。以降に届いた応答は破棄される。
    pub fn stop(&self) {
        self.token.cancel();
    }
}

async fn run<S: FrameSource>(
    config: Config,
    mut source: S,
    backend: Arc<dyn PoseBackend>,
    events: mpsc::Sender<PipelineEvent>,
    mut commands: mpsc::Receiver<PipelineCommand>,
    token: CancellationToken,
) {
    let analyzer = Arc::new(Mutex::new(MotionAnalyzer::new(config.analysis.clone())));
    let inflight = SingleFlight::default();
    let started = Instant::now();

    if config.features.queue_monitor {
        spawn_queue_monitor(&config, Arc::clone(&backend), token.clone());
    }
    if config.features.heart_rate {
        spawn_heart_rate_poll(&config, Arc::clone(&backend), events.clone(), token.clone());
    }

    let mut tick = interval(config.pipeline.frame_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            cmd = commands.recv() => match cmd {
                Some(cmd) => {
                    handle_command(cmd, &backend, &analyzer, &events).await;
                }
                None => break,
            },
            _ = tick.tick() => {
                let Some(guard) = inflight.try_acquire() else {
                    // 前の送信がまだ返ってきていない
                    continue;
                };

                let frame = match source.sample() {
                    Ok(frame) => frame,
                    Err(e) => {
                        eprintln!("[pipeline] capture failed: {e}");
                        drop(guard);
                        continue;
                    }
                };

                let elapsed = started.elapsed().as_secs_f64();
                let backend = Arc::clone(&backend);
                let analyzer = Arc::clone(&analyzer);
                let events = events.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    let result = backend.process_frame(&frame.data_url).await;
                    // 停止後に届いた応答は古いので捨てる
                    if token.is_cancelled() {
                        return;
                    }
                    let resp = match result {
                        Ok(resp) => resp,
                        Err(e) => {
                            eprintln!("[pipeline] frame dropped: {e}");
                            return;
                        }
                    };
                    if !resp.is_success() {
                        return;
                    }
                    let Some(snapshot) = resp.snapshot() else {
                        // ポーズ未検出または点数が合わない
                        return;
                    };

                    let metrics = analyzer.lock().await.update(&snapshot, elapsed);
                    let processed_jpeg = resp.image.as_deref().and_then(decode_data_url);
                    let _ = events
                        .send(PipelineEvent::Frame {
                            snapshot,
                            metrics,
                            processed_jpeg,
                            bpm: resp.bpm,
                            elapsed,
                        })
                        .await;
                });
            }
        }
    }

    source.close();
    token.cancel();
}

async fn handle_command(
    command: PipelineCommand,
    backend: &Arc<dyn PoseBackend>,
    analyzer: &Arc<Mutex<MotionAnalyzer>>,
    events: &mpsc::Sender<PipelineEvent>,
) {
    match command {
        PipelineCommand::StartRecording => match backend.start_recording().await {
            Ok(_) => {
                // 記録は常に新しい計測として始める
                analyzer.lock().await.reset();
                let _ = events.send(PipelineEvent::RecordingStarted).await;
            }
            Err(e) => {
                let _ = events
                    .send(PipelineEvent::Status(format!("recording failed: {e}")))
                    .await;
            }
        },
        PipelineCommand::StopRecording => match backend.stop_recording().await {
            Ok(resp) => {
                let _ = events
                    .send(PipelineEvent::RecordingStopped {
                        records: resp.records,
                        heart_rate: resp.heart_rate,
                    })
                    .await;
            }
            Err(e) => {
                let _ = events
                    .send(PipelineEvent::Status(format!("stop recording failed: {e}")))
                    .await;
            }
        },
    }
}

/// バックエンド側キューの深さを定期監視する。深くなっていたら
/// 送信周期が速すぎるサイン。
fn spawn_queue_monitor(config: &Config, backend: Arc<dyn PoseBackend>, token: CancellationToken) {
    let poll = Duration::from_secs(config.pipeline.queue_poll_secs);
    let warn_depth = config.pipeline.queue_warn_depth;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(poll) => {
                    match backend.queue_status().await {
                        Ok(q) if q.frame_queue_size > warn_depth => {
                            eprintln!(
                                "[pipeline] backend queue depth {} exceeds {}",
                                q.frame_queue_size, warn_depth
                            );
                        }
                        Ok(_) => {}
                        Err(e) => eprintln!("[pipeline] queue poll failed: {e}"),
                    }
                }
            }
        }
    });
}

fn spawn_heart_rate_poll(
    config: &Config,
    backend: Arc<dyn PoseBackend>,
    events: mpsc::Sender<PipelineEvent>,
    token: CancellationToken,
) {
    let poll = Duration::from_secs(config.pipeline.heart_rate_poll_secs);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(poll) => {
                    match backend.heart_rate().await {
                        Ok(hr) => {
                            if token.is_cancelled() {
                                break;
                            }
                            let _ = events
                                .send(PipelineEvent::HeartRate {
                                    bpm: hr.bpm,
                                    detecting: hr.detecting,
                                })
                                .await;
                        }
                        Err(e) => eprintln!("[pipeline] heart rate poll failed: {e}"),
                    }
                }
            }
        }
    });
}
