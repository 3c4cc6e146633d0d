use std::time::{Duration, Instant};

/// ステータス表示の種類。Recordingだけは自動で消えない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Active,
    Recording,
    Error,
}

/// 一時的なステータス表示。Recording以外は3秒で自動的に隠れる。
#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub message: String,
    pub kind: StatusKind,
    posted_at: Instant,
}

impl StatusBanner {
    const AUTO_HIDE: Duration = Duration::from_secs(3);

    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self::posted_at(message, kind, Instant::now())
    }

    pub fn posted_at(message: impl Into<String>, kind: StatusKind, at: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            posted_at: at,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.kind == StatusKind::Recording
            || now.duration_since(self.posted_at) < Self::AUTO_HIDE
    }
}

/// セッション状態。外から直接フラグをいじらせず、遷移操作だけを公開する。
#[derive(Debug, Default)]
pub struct SessionState {
    camera_active: bool,
    recording: bool,
    started_at: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.camera_active = true;
        self.started_at = Some(now);
    }

    /// カメラ停止。記録中フラグも含め全てリセットされる。
    pub fn stop(&mut self) {
        self.camera_active = false;
        self.recording = false;
        self.started_at = None;
    }

    /// カメラ稼働中のみ記録を開始できる
    pub fn begin_recording(&mut self) -> bool {
        if self.camera_active {
            self.recording = true;
        }
        self.recording
    }

    pub fn end_recording(&mut self) {
        self.recording = false;
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn recording(&self) -> bool {
        self.recording
    }

    /// セッション開始からの経過秒
    pub fn elapsed_secs(&self, now: Instant) -> Option<f64> {
        self.started_at
            .map(|t| now.duration_since(t).as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_requires_active_camera() {
        let mut s = SessionState::new();
        assert!(!s.begin_recording());
        s.start(Instant::now());
        assert!(s.begin_recording());
        assert!(s.recording());
    }

    #[test]
    fn test_stop_resets_everything() {
        let mut s = SessionState::new();
        let now = Instant::now();
        s.start(now);
        s.begin_recording();
        s.stop();
        assert!(!s.camera_active());
        assert!(!s.recording());
        assert_eq!(s.elapsed_secs(now), None);
    }

    #[test]
    fn test_elapsed() {
        let mut s = SessionState::new();
        let start = Instant::now();
        s.start(start);
        let later = start + Duration::from_millis(2500);
        assert!((s.elapsed_secs(later).unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_banner_auto_hides_after_3s() {
        let at = Instant::now();
        let banner = StatusBanner::posted_at("camera started", StatusKind::Active, at);
        assert!(banner.is_visible(at + Duration::from_secs(2)));
        assert!(!banner.is_visible(at + Duration::from_secs(3)));
    }

    #[test]
    fn test_recording_banner_persists() {
        let at = Instant::now();
        let banner = StatusBanner::posted_at("recording", StatusKind::Recording, at);
        assert!(banner.is_visible(at + Duration::from_secs(3600)));
    }
}
