use crate::pose::LandmarkIndex;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 16] = [
    // 上半身
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    // 胴体
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    // 下半身
    (LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee),
    (LandmarkIndex::RightHip, LandmarkIndex::RightKnee),
    (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
    (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftHeel),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightHeel),
    (LandmarkIndex::LeftHeel, LandmarkIndex::LeftFootIndex),
    (LandmarkIndex::RightHeel, LandmarkIndex::RightFootIndex),
];

/// ランドマーク点の色 (RGB)
pub const POINT_COLOR: u32 = 0x00C864; // rgb(0, 200, 100)

/// 骨格線の色 (RGB)
pub const BONE_COLOR: u32 = 0x6496FA; // rgb(100, 150, 250)

/// 時系列チャートの4チャンネル色（左肘・右肘・左手首・右手首）
pub const CHANNEL_COLORS: [u32; 4] = [0x1F77B4, 0xFF7F0E, 0x2CA02C, 0xD62728];
