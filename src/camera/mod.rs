#[cfg(feature = "desktop")]
pub mod capture;

#[cfg(feature = "desktop")]
pub use capture::Webcam;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// 1回の送信のためだけに存在する圧縮済みフレーム
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// base64 JPEG データURL
    pub data_url: String,
}

#[derive(Debug, Error)]
pub enum CameraError {
    /// カメラが開けない（権限拒否とデバイス不在は区別できない）
    #[error("camera {0} could not be opened (permission denied or device missing)")]
    PermissionDenied(i32),
    #[error("empty frame from camera")]
    EmptyFrame,
    #[cfg(feature = "desktop")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// フレーム供給源。パイプラインはこの境界だけを知る。
/// `close`はパイプラインの全終了経路で必ず呼ばれる。
pub trait FrameSource: Send + 'static {
    /// 現在のフレームを圧縮して返す。同期処理で、エンコードコストが上限。
    fn sample(&mut self) -> Result<FrameSample, CameraError>;
    /// ストリームを解放する。冪等。
    fn close(&mut self);
}

pub fn encode_jpeg_data_url(jpeg: &[u8]) -> String {
    format!("{}{}", JPEG_DATA_URL_PREFIX, BASE64.encode(jpeg))
}

/// データURLからバイト列を取り出す。base64部が壊れていればNone。
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (_, payload) = url.split_once("base64,")?;
    BASE64.decode(payload).ok()
}
