use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// BlazePose 33ランドマークのインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// 解析で参照する上半身のランドマーク（肩・肘・手首）
    pub const UPPER_BODY: [LandmarkIndex; 6] = [
        LandmarkIndex::LeftShoulder,
        LandmarkIndex::RightShoulder,
        LandmarkIndex::LeftElbow,
        LandmarkIndex::RightElbow,
        LandmarkIndex::LeftWrist,
        LandmarkIndex::RightWrist,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEyeInner),
            2 => Some(Self::LeftEye),
            3 => Some(Self::LeftEyeOuter),
            4 => Some(Self::RightEyeInner),
            5 => Some(Self::RightEye),
            6 => Some(Self::RightEyeOuter),
            7 => Some(Self::LeftEar),
            8 => Some(Self::RightEar),
            9 => Some(Self::MouthLeft),
            10 => Some(Self::MouthRight),
            11 => Some(Self::LeftShoulder),
            12 => Some(Self::RightShoulder),
            13 => Some(Self::LeftElbow),
            14 => Some(Self::RightElbow),
            15 => Some(Self::LeftWrist),
            16 => Some(Self::RightWrist),
            17 => Some(Self::LeftPinky),
            18 => Some(Self::RightPinky),
            19 => Some(Self::LeftIndex),
            20 => Some(Self::RightIndex),
            21 => Some(Self::LeftThumb),
            22 => Some(Self::RightThumb),
            23 => Some(Self::LeftHip),
            24 => Some(Self::RightHip),
            25 => Some(Self::LeftKnee),
            26 => Some(Self::RightKnee),
            27 => Some(Self::LeftAnkle),
            28 => Some(Self::RightAnkle),
            29 => Some(Self::LeftHeel),
            30 => Some(Self::RightHeel),
            31 => Some(Self::LeftFootIndex),
            32 => Some(Self::RightFootIndex),
            _ => None,
        }
    }
}

/// 単一ランドマーク（カメラ相対の正規化座標、おおむね0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 表示座標系に変換 (x, 1-y, -z)。
    /// カメラ座標はyが下向き、zが手前向きなので反転する。
    pub fn plot_point(&self) -> Point3<f64> {
        Point3::new(self.x, 1.0 - self.y, -self.z)
    }
}

/// 1フレーム分の33ランドマーク。受信後は不変。
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSnapshot {
    landmarks: Vec<Landmark>,
}

impl PoseSnapshot {
    /// 33点そろっていなければNone
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Option<Self> {
        if landmarks.len() == LandmarkIndex::COUNT {
            Some(Self { landmarks })
        } else {
            None
        }
    }

    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// 上半身のランドマークがすべて有限値か。
    /// 欠けていればそのフレームは解析から除外される。
    pub fn has_upper_body(&self) -> bool {
        LandmarkIndex::UPPER_BODY
            .iter()
            .all(|&i| self.get(i).is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(value: f64) -> PoseSnapshot {
        let landmarks = vec![Landmark::new(value, value, value); LandmarkIndex::COUNT];
        PoseSnapshot::from_landmarks(landmarks).unwrap()
    }

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 33);
    }

    #[test]
    fn test_landmark_index_from_index() {
        assert_eq!(LandmarkIndex::from_index(0), Some(LandmarkIndex::Nose));
        assert_eq!(LandmarkIndex::from_index(15), Some(LandmarkIndex::LeftWrist));
        assert_eq!(
            LandmarkIndex::from_index(32),
            Some(LandmarkIndex::RightFootIndex)
        );
        assert_eq!(LandmarkIndex::from_index(33), None);
    }

    #[test]
    fn test_snapshot_requires_33_landmarks() {
        let short = vec![Landmark::new(0.0, 0.0, 0.0); 17];
        assert!(PoseSnapshot::from_landmarks(short).is_none());
        assert!(PoseSnapshot::from_landmarks(
            vec![Landmark::new(0.0, 0.0, 0.0); 33]
        )
        .is_some());
    }

    #[test]
    fn test_plot_point_flips_y_and_z() {
        let lm = Landmark::new(0.25, 0.75, 0.1);
        let p = lm.plot_point();
        assert_eq!(p.x, 0.25);
        assert_eq!(p.y, 0.25);
        assert_eq!(p.z, -0.1);
    }

    #[test]
    fn test_has_upper_body_rejects_nan() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LandmarkIndex::COUNT];
        landmarks[LandmarkIndex::LeftWrist as usize] = Landmark::new(f64::NAN, 0.5, 0.0);
        let snapshot = PoseSnapshot::from_landmarks(landmarks).unwrap();
        assert!(!snapshot.has_upper_body());
        assert!(snapshot_at(0.5).has_upper_body());
    }

    #[test]
    fn test_landmark_deserialize() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":-0.05}"#).unwrap();
        assert_eq!(lm.x, 0.1);
        assert_eq!(lm.y, 0.2);
        assert_eq!(lm.z, -0.05);
    }
}
