use crate::config::AnalysisConfig;

/// 反応検出の状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReactionState {
    /// ベースライン確立中（出力なし）
    Calibrating,
    /// 速い動きを待っている
    Ready,
    /// 速い動きを検出。reaction_msは基準時刻からの経過ミリ秒。
    Detected { reaction_ms: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Calibrating { seen: u32 },
    Armed { epoch_s: f64 },
    Latched { reaction_ms: f64 },
}

/// 二段しきい値のヒステリシスで「反応」を検出する。
///
/// 最初の`baseline_frames`回の観測でベースラインを確立し、以後は平均速度が
/// `rise_threshold`を上回った立ち上がりで検出をラッチ、`fall_threshold`を
/// 下回った立ち下がりでラッチを解除して基準時刻を取り直す。統計的に較正された
/// 検出器ではなく、経験則のデバウンスそのもの。
#[derive(Debug)]
pub struct ReactionDetector {
    baseline_frames: u32,
    rise_threshold: f64,
    fall_threshold: f64,
    phase: Phase,
}

impl ReactionDetector {
    pub fn new(baseline_frames: u32, rise_threshold: f64, fall_threshold: f64) -> Self {
        Self {
            baseline_frames,
            rise_threshold,
            fall_threshold,
            phase: Phase::Calibrating { seen: 0 },
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.baseline_frames,
            config.rise_threshold,
            config.fall_threshold,
        )
    }

    /// 1観測ぶん進める。`avg_speed`はスケール済み平均速度、`now_s`は秒。
    pub fn observe(&mut self, avg_speed: f64, now_s: f64) -> ReactionState {
        match self.phase {
            Phase::Calibrating { seen } => {
                let seen = seen + 1;
                if seen >= self.baseline_frames {
                    // baseline established; detection possible from the next observation
                    self.phase = Phase::Armed { epoch_s: now_s };
                    ReactionState::Ready
                } else {
                    self.phase = Phase::Calibrating { seen };
                    ReactionState::Calibrating
                }
            }
            Phase::Armed { epoch_s } => {
                if avg_speed > self.rise_threshold {
                    let reaction_ms = (now_s - epoch_s) * 1000.0;
                    self.phase = Phase::Latched { reaction_ms };
                    ReactionState::Detected { reaction_ms }
                } else {
                    ReactionState::Ready
                }
            }
            Phase::Latched { reaction_ms } => {
                if avg_speed < self.fall_threshold {
                    // movement ended, re-arm with a fresh epoch
                    self.phase = Phase::Armed { epoch_s: now_s };
                    ReactionState::Ready
                } else {
                    ReactionState::Detected { reaction_ms }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Calibrating { seen: 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn detector() -> ReactionDetector {
        ReactionDetector::new(30, 1.5, 0.5)
    }

    #[test]
    fn test_no_detection_during_baseline() {
        let mut d = detector();
        // high speed during calibration must not trigger anything
        for i in 0..29 {
            let state = d.observe(10.0, i as f64 * 0.1);
            assert_eq!(state, ReactionState::Calibrating);
        }
    }

    #[test]
    fn test_thirty_first_observation_detects() {
        let mut d = detector();
        for i in 1..=29 {
            d.observe(0.1, i as f64 * 0.1);
        }
        // 30th observation establishes the baseline at t=3.0
        assert_eq!(d.observe(0.1, 3.0), ReactionState::Ready);
        // 31st observation above the rise threshold latches
        match d.observe(2.0, 3.1) {
            ReactionState::Detected { reaction_ms } => {
                assert!((reaction_ms - 100.0).abs() < EPS, "got {reaction_ms}");
            }
            other => panic!("expected Detected, got {other:?}"),
        }
    }

    #[test]
    fn test_latch_holds_until_falling_edge() {
        let mut d = detector();
        for i in 1..=30 {
            d.observe(0.1, i as f64 * 0.1);
        }
        let first = d.observe(2.0, 3.1);
        // speed between the thresholds keeps the latch
        assert_eq!(d.observe(1.0, 3.2), first);
        assert_eq!(d.observe(1.4, 3.3), first);
    }

    #[test]
    fn test_falling_edge_rearms_epoch() {
        let mut d = detector();
        for i in 1..=30 {
            d.observe(0.1, i as f64 * 0.1);
        }
        d.observe(2.0, 3.1);
        // drop below the fall threshold: latch cleared, epoch moves to 3.5
        assert_eq!(d.observe(0.2, 3.5), ReactionState::Ready);
        match d.observe(3.0, 4.0) {
            ReactionState::Detected { reaction_ms } => {
                assert!((reaction_ms - 500.0).abs() < EPS, "got {reaction_ms}");
            }
            other => panic!("expected Detected, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_restarts_calibration() {
        let mut d = detector();
        for i in 1..=30 {
            d.observe(0.1, i as f64 * 0.1);
        }
        d.reset();
        assert_eq!(d.observe(5.0, 10.0), ReactionState::Calibrating);
    }
}
