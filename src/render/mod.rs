pub mod chart;
pub mod projection;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use chart::MotionChart;
pub use projection::{project, ProjectedSkeleton, ViewAngle};
pub use skeleton::SKELETON_CONNECTIONS;
#[cfg(feature = "desktop")]
pub use minifb::Key;
#[cfg(feature = "desktop")]
pub use window::{MinifbRenderer, Rect};
