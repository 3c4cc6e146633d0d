//! バックエンド疎通プローブ。各エンドポイントを順に叩いて応答を表示する。
//! 実カメラは不要（ダミーフレームを送る）。

use cogniactive_client::api::{HttpBackend, PoseBackend, RetryPolicy};
use cogniactive_client::camera::encode_jpeg_data_url;
use cogniactive_client::config::Config;

// 2x2の白いJPEG
const PROBE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x10, 0x0B, 0x0C, 0x0E, 0x0C, 0x0A, 0x10, 0x0E,
    0x0D, 0x0E, 0x12, 0x11, 0x10, 0x13, 0x18, 0x28, 0x1A, 0x18, 0x16, 0x16, 0x18, 0x31, 0x23,
    0x25, 0x1D, 0x28, 0x3A, 0x33, 0x3D, 0x3C, 0x39, 0x33, 0x38, 0x37, 0x40, 0x48, 0x5C, 0x4E,
    0x40, 0x44, 0x57, 0x45, 0x37, 0x38, 0x50, 0x6D, 0x51, 0x57, 0x5F, 0x62, 0x67, 0x68, 0x67,
    0x3E, 0x4D, 0x71, 0x79, 0x70, 0x64, 0x78, 0x5C, 0x65, 0x67, 0x63, 0xFF, 0xC0, 0x00, 0x0B,
    0x08, 0x00, 0x02, 0x00, 0x02, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00, 0x1F, 0x00, 0x00,
    0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0xFF, 0xC4, 0x00,
    0x14, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, 0x7F, 0xFF,
    0xD9,
];

#[tokio::main]
async fn main() {
    println!("=== バックエンドプローブ ===");
    println!();

    let config = Config::load_or_default("config.toml");
    println!("base_url: {}", config.backend.base_url);

    let retry = RetryPolicy::from_config(&config.pipeline);
    let backend = match HttpBackend::new(&config.backend, retry) {
        Ok(b) => b,
        Err(e) => {
            println!("client build failed: {e}");
            return;
        }
    };

    match backend.start_camera().await {
        Ok(r) => println!("start_camera:     {}", r.status),
        Err(e) => {
            println!("start_camera:     {e}");
            println!();
            println!("backend unreachable, aborting");
            return;
        }
    }

    match backend.start_processing().await {
        Ok(r) => println!("start_processing: {}", r.message),
        Err(e) => println!("start_processing: {e}"),
    }

    let image = encode_jpeg_data_url(PROBE_JPEG);
    match backend.process_frame(&image).await {
        Ok(r) => println!(
            "process_frame:    {} (landmarks: {}, bpm: {:?})",
            r.status,
            r.landmarks.as_ref().map_or(0, |l| l.len()),
            r.bpm
        ),
        Err(e) => println!("process_frame:    {e}"),
    }

    match backend.queue_status().await {
        Ok(r) => println!("queue_status:     depth {}", r.frame_queue_size),
        Err(e) => println!("queue_status:     {e}"),
    }

    match backend.heart_rate().await {
        Ok(r) => println!(
            "get_heart_rate:   {} bpm (detecting: {})",
            r.bpm, r.detecting
        ),
        Err(e) => println!("get_heart_rate:   {e}"),
    }

    match backend.stop_camera().await {
        Ok(r) => println!("stop_camera:      {}", r.status),
        Err(e) => println!("stop_camera:      {e}"),
    }
}
