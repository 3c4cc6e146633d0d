use crate::pose::{LandmarkIndex, PoseSnapshot};
use crate::render::skeleton::SKELETON_CONNECTIONS;

/// 3D骨格をどの方向から見るか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAngle {
    /// 正面（カメラと同じ向き）
    Front,
    /// 右側面
    Side,
}

/// 正規化された表示座標に投影済みの骨格。
/// u は右向き、v は上向きで、どちらもおおよそ [0, 1]。
#[derive(Debug, Clone, Default)]
pub struct ProjectedSkeleton {
    pub points: Vec<(f64, f64)>,
    pub segments: Vec<((f64, f64), (f64, f64))>,
}

fn project_landmark(snapshot: &PoseSnapshot, index: LandmarkIndex, view: ViewAngle) -> Option<(f64, f64)> {
    let lm = snapshot.get(index);
    if !lm.is_finite() {
        return None;
    }
    let p = lm.plot_point();
    let uv = match view {
        // 表示空間は (x, 1-y, -z)。正面はそのまま x/高さ。
        ViewAngle::Front => (p.x, p.y),
        // 側面は奥行き軸を横に倒す。zはおおよそ[-0.5, 0.5]なので0.5を足して寄せる
        ViewAngle::Side => (0.5 - p.z, p.y),
    };
    Some(uv)
}

/// スナップショットを指定ビューに投影する。座標が不正なランドマークは
/// 点からも線からも落とす。
pub fn project(snapshot: &PoseSnapshot, view: ViewAngle) -> ProjectedSkeleton {
    let mut out = ProjectedSkeleton::default();

    for i in 0..LandmarkIndex::COUNT {
        let Some(index) = LandmarkIndex::from_index(i) else {
            continue;
        };
        if let Some(uv) = project_landmark(snapshot, index, view) {
            out.points.push(uv);
        }
    }

    for &(a, b) in SKELETON_CONNECTIONS.iter() {
        let (Some(pa), Some(pb)) = (
            project_landmark(snapshot, a, view),
            project_landmark(snapshot, b, view),
        ) else {
            continue;
        };
        out.segments.push((pa, pb));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    fn full_snapshot() -> PoseSnapshot {
        let landmarks = (0..33)
            .map(|_| Landmark {
                x: 0.25,
                y: 0.75,
                z: -0.1,
            })
            .collect::<Vec<_>>();
        PoseSnapshot::from_landmarks(landmarks).unwrap()
    }

    #[test]
    fn test_front_projection_flips_y() {
        let snapshot = full_snapshot();
        let out = project(&snapshot, ViewAngle::Front);
        assert_eq!(out.points.len(), 33);
        let (u, v) = out.points[0];
        assert!((u - 0.25).abs() < 1e-9);
        assert!((v - 0.25).abs() < 1e-9); // 1 - 0.75
    }

    #[test]
    fn test_side_projection_uses_depth() {
        let snapshot = full_snapshot();
        let out = project(&snapshot, ViewAngle::Side);
        let (u, v) = out.points[0];
        // z = -0.1 → 表示空間で -z = 0.1 → u = 0.5 - 0.1
        assert!((u - 0.4).abs() < 1e-9);
        assert!((v - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_full_snapshot_yields_all_segments() {
        let snapshot = full_snapshot();
        let out = project(&snapshot, ViewAngle::Front);
        assert_eq!(out.segments.len(), SKELETON_CONNECTIONS.len());
    }

    #[test]
    fn test_nan_landmark_drops_touching_segments() {
        let mut landmarks: Vec<Landmark> = (0..33)
            .map(|_| Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0,
            })
            .collect();
        landmarks[LandmarkIndex::LeftWrist as usize].x = f64::NAN;
        let snapshot = PoseSnapshot::from_landmarks(landmarks).unwrap();
        let out = project(&snapshot, ViewAngle::Front);
        assert_eq!(out.points.len(), 32);
        // 左手首に触れるのは (13,15) の1本だけ
        assert_eq!(out.segments.len(), SKELETON_CONNECTIONS.len() - 1);
    }
}
