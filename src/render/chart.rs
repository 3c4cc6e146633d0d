use crate::pose::{LandmarkIndex, PoseSnapshot};

/// チャートに流す関節。順番は凡例の並びと同じ。
pub const CHART_JOINTS: [LandmarkIndex; 4] = [
    LandmarkIndex::LeftElbow,
    LandmarkIndex::RightElbow,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
];

pub const CHANNEL_NAMES: [&str; 4] = ["Left Elbow", "Right Elbow", "Left Wrist", "Right Wrist"];

/// 関節高さの時系列チャート。値は (1 - y) * 100 で、画面上向きが正。
/// 追記専用で、表示側は直近ウィンドウだけを読む。
#[derive(Debug, Clone)]
pub struct MotionChart {
    window_secs: f64,
    start: Option<f64>,
    channels: [Vec<(f64, f64)>; 4],
}

impl MotionChart {
    pub const DEFAULT_WINDOW_SECS: f64 = 10.0;

    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            start: None,
            channels: Default::default(),
        }
    }

    /// スナップショットから1サンプル追記する。最初のpushの時刻が原点。
    /// 対象関節が欠けているか非有限ならスキップしてNoneを返す。
    pub fn push(&mut self, snapshot: &PoseSnapshot, now_s: f64) -> Option<f64> {
        let mut values = [0.0f64; 4];
        for (slot, &joint) in values.iter_mut().zip(CHART_JOINTS.iter()) {
            let lm = snapshot.get(joint);
            if !lm.is_finite() {
                return None;
            }
            *slot = (1.0 - lm.y) * 100.0;
        }

        let start = *self.start.get_or_insert(now_s);
        let elapsed = now_s - start;
        for (channel, value) in self.channels.iter_mut().zip(values) {
            channel.push((elapsed, value));
        }
        Some(elapsed)
    }

    pub fn reset(&mut self) {
        self.start = None;
        for channel in &mut self.channels {
            channel.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// 横軸の表示範囲。最新サンプルが右端、幅は常にwindow_secs。
    pub fn x_range(&self) -> (f64, f64) {
        let latest = self
            .channels[0]
            .last()
            .map(|&(t, _)| t)
            .unwrap_or(0.0);
        ((latest - self.window_secs).max(0.0), latest.max(self.window_secs))
    }

    /// 指定チャンネルのうちウィンドウ内のサンプルだけを返す
    pub fn visible(&self, channel: usize) -> &[(f64, f64)] {
        let series = &self.channels[channel];
        let (lo, _) = self.x_range();
        let from = series.partition_point(|&(t, _)| t < lo);
        &series[from..]
    }
}

impl Default for MotionChart {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_SECS)
    }
}
