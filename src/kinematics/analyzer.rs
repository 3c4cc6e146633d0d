use nalgebra::Point2;

use crate::config::AnalysisConfig;
use crate::kinematics::history::RollingHistory;
use crate::kinematics::metrics::{acceleration, joint_angle_deg, speed_between};
use crate::kinematics::reaction::{ReactionDetector, ReactionState};
use crate::pose::{Landmark, LandmarkIndex, PoseSnapshot};

/// 1フレームぶんの派生メトリクス。毎サイクル上書きされる。
#[derive(Debug, Clone, Copy)]
pub struct MotionMetrics {
    /// 肘の関節角度（度）
    pub left_elbow_angle: f64,
    pub right_elbow_angle: f64,
    /// 手首の移動速度（units/s、未スケール）
    pub left_wrist_speed: f64,
    pub right_wrist_speed: f64,
    /// 追跡4点の平均速度（スケール済み）
    pub avg_speed: f64,
    pub acceleration: f64,
    pub peak_speed: f64,
    /// 直近ウィンドウの平均速度
    pub rolling_avg_speed: f64,
    /// 履歴中のクイックムーブ回数
    pub quick_moves: usize,
    pub reaction: ReactionState,
}

/// 連続するスナップショットから速度・加速度・関節角度・反応状態を導出する。
///
/// 必要なランドマークが欠けたスナップショットは更新ごと捨てられ、
/// 前回参照も置き換えない（次サイクルの差分を壊さないため）。
pub struct MotionAnalyzer {
    config: AnalysisConfig,
    previous: Option<(PoseSnapshot, f64)>,
    speeds: RollingHistory<f64>,
    peak_speed: f64,
    reaction: ReactionDetector,
}

impl MotionAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let speeds = RollingHistory::new(config.history_cap);
        let reaction = ReactionDetector::from_config(&config);
        Self {
            config,
            previous: None,
            speeds,
            peak_speed: 0.0,
            reaction,
        }
    }

    /// 記録セッション開始時に呼ぶ。履歴・ピーク・反応検出をすべて初期化。
    pub fn reset(&mut self) {
        self.previous = None;
        self.speeds.clear();
        self.peak_speed = 0.0;
        self.reaction.reset();
    }

    /// スナップショットを1件取り込む。差分が取れないフレーム
    /// （初回、ランドマーク欠落、dt<=0）はNone。
    pub fn update(&mut self, snapshot: &PoseSnapshot, now_s: f64) -> Option<MotionMetrics> {
        if !snapshot.has_upper_body() {
            return None;
        }

        let (prev, prev_t) = match &self.previous {
            Some((p, t)) => (p, *t),
            None => {
                self.previous = Some((snapshot.clone(), now_s));
                return None;
            }
        };

        let dt = now_s - prev_t;
        if dt <= 0.0 {
            self.previous = Some((snapshot.clone(), now_s));
            return None;
        }

        let left_wrist_speed =
            speed_between(prev.get(LandmarkIndex::LeftWrist), snapshot.get(LandmarkIndex::LeftWrist), dt);
        let right_wrist_speed =
            speed_between(prev.get(LandmarkIndex::RightWrist), snapshot.get(LandmarkIndex::RightWrist), dt);
        let left_elbow_speed =
            speed_between(prev.get(LandmarkIndex::LeftElbow), snapshot.get(LandmarkIndex::LeftElbow), dt);
        let right_elbow_speed =
            speed_between(prev.get(LandmarkIndex::RightElbow), snapshot.get(LandmarkIndex::RightElbow), dt);

        let avg_speed = (left_wrist_speed + right_wrist_speed + left_elbow_speed + right_elbow_speed)
            / 4.0
            * self.config.speed_scale;

        let accel = match self.speeds.latest() {
            Some(&prev_speed) => acceleration(avg_speed, prev_speed, dt),
            None => 0.0,
        };
        self.speeds.push(avg_speed);

        if avg_speed > self.peak_speed {
            self.peak_speed = avg_speed;
        }

        let window = self.speeds.recent(self.config.avg_window);
        let (sum, count) = window.fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
        let rolling_avg_speed = sum / count as f64;

        let quick_moves = self
            .speeds
            .iter()
            .filter(|&&s| s > self.config.quick_move_threshold)
            .count();

        let reaction = self.reaction.observe(avg_speed, now_s);

        let left_elbow_angle = elbow_angle(
            snapshot,
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::LeftElbow,
            LandmarkIndex::LeftWrist,
        );
        let right_elbow_angle = elbow_angle(
            snapshot,
            LandmarkIndex::RightShoulder,
            LandmarkIndex::RightElbow,
            LandmarkIndex::RightWrist,
        );

        self.previous = Some((snapshot.clone(), now_s));

        Some(MotionMetrics {
            left_elbow_angle,
            right_elbow_angle,
            left_wrist_speed,
            right_wrist_speed,
            avg_speed,
            acceleration: accel,
            peak_speed: self.peak_speed,
            rolling_avg_speed,
            quick_moves,
            reaction,
        })
    }
}

/// 表示座標系（x, 1-y）での肘の角度
fn elbow_angle(
    snapshot: &PoseSnapshot,
    shoulder: LandmarkIndex,
    elbow: LandmarkIndex,
    wrist: LandmarkIndex,
) -> f64 {
    let plane = |lm: &Landmark| Point2::new(lm.x, 1.0 - lm.y);
    joint_angle_deg(
        plane(snapshot.get(shoulder)),
        plane(snapshot.get(elbow)),
        plane(snapshot.get(wrist)),
    )
}
