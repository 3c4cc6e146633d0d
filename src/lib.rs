pub mod api;
pub mod camera;
pub mod config;
pub mod kinematics;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod session;
