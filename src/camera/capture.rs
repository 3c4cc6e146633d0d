use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::camera::{encode_jpeg_data_url, CameraError, FrameSample, FrameSource};
use crate::config::CameraConfig;

/// OpenCVを使用したWebカメラ。640x480で開き、送信用に320x240へ縮小して
/// JPEGエンコードする。
pub struct Webcam {
    capture: VideoCapture,
    send_width: i32,
    send_height: i32,
    jpeg_quality: i32,
}

impl Webcam {
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let mut capture = VideoCapture::new(config.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CameraError::PermissionDenied(config.index));
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64)?;
        // 常に最新フレームを読むため
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        eprintln!(
            "[camera] opened index {} at {}x{}",
            config.index, actual_width, actual_height
        );

        Ok(Self {
            capture,
            send_width: config.send_width as i32,
            send_height: config.send_height as i32,
            jpeg_quality: config.jpeg_quality,
        })
    }
}

impl FrameSource for Webcam {
    fn sample(&mut self) -> Result<FrameSample, CameraError> {
        let mut frame = Mat::default();
        self.capture.read(&mut frame)?;
        if frame.empty() {
            return Err(CameraError::EmptyFrame);
        }

        let mut small = Mat::default();
        imgproc::resize(
            &frame,
            &mut small,
            Size::new(self.send_width, self.send_height),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )?;

        let params = Vector::from_iter([imgcodecs::IMWRITE_JPEG_QUALITY, self.jpeg_quality]);
        let mut buf: Vector<u8> = Vector::new();
        imgcodecs::imencode(".jpg", &small, &mut buf, &params)?;

        Ok(FrameSample {
            data_url: encode_jpeg_data_url(&buf.to_vec()),
        })
    }

    fn close(&mut self) {
        if let Err(e) = self.capture.release() {
            eprintln!("[camera] release failed: {e}");
        }
    }
}
