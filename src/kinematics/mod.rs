pub mod analyzer;
pub mod history;
pub mod metrics;
pub mod reaction;

pub use analyzer::{MotionAnalyzer, MotionMetrics};
pub use history::RollingHistory;
pub use metrics::{acceleration, distance, joint_angle_deg, speed_between};
pub use reaction::{ReactionDetector, ReactionState};
