use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use opencv::core::Mat;
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::render::chart::{MotionChart, CHART_JOINTS};
use crate::render::projection::ProjectedSkeleton;
use crate::render::skeleton::{BONE_COLOR, CHANNEL_COLORS, POINT_COLOR};

const BACKGROUND_COLOR: u32 = 0x101418;
const PANEL_BORDER_COLOR: u32 = 0x404850;

/// バッファ内の描画領域（ピクセル単位）
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// minifbを使用したレンダラー。映像・正面/側面骨格・時系列チャートを
/// 1枚のバッファにパネル分割して描く。
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        let buffer = vec![BACKGROUND_COLOR; width * height];

        Ok(Self {
            window,
            buffer,
            width,
            height,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// ステータスはタイトルバーに出す
    pub fn set_status(&mut self, status: &str) {
        self.window.set_title(status);
    }

    pub fn clear(&mut self) {
        self.buffer.fill(BACKGROUND_COLOR);
    }

    /// JPEGバイト列をデコードしてパネルにコピー。サイズが合わない分は
    /// クロップ/パディング。
    pub fn draw_jpeg(&mut self, jpeg: &[u8], rect: Rect) -> Result<()> {
        let data = opencv::core::Vector::from_slice(jpeg);
        let frame = imgcodecs::imdecode(&data, imgcodecs::IMREAD_COLOR)?;
        if frame.empty() {
            return Ok(());
        }

        let frame_width = frame.cols() as usize;
        let frame_height = frame.rows() as usize;

        for y in 0..rect.h.min(frame_height) {
            for x in 0..rect.w.min(frame_width) {
                let pixel = frame.at_2d::<opencv::core::Vec3b>(y as i32, x as i32)?;
                // BGR -> RGB -> u32
                let r = pixel[2] as u32;
                let g = pixel[1] as u32;
                let b = pixel[0] as u32;
                self.set_pixel((rect.x + x) as i32, (rect.y + y) as i32, (r << 16) | (g << 8) | b);
            }
        }

        Ok(())
    }

    /// 投影済み骨格をパネルに描画。vは上向き正なのでここで反転する。
    pub fn draw_skeleton(&mut self, skeleton: &ProjectedSkeleton, rect: Rect) {
        self.draw_border(rect);

        let to_pixel = |(u, v): (f64, f64)| {
            let px = rect.x as f64 + u.clamp(0.0, 1.0) * rect.w as f64;
            let py = rect.y as f64 + (1.0 - v.clamp(0.0, 1.0)) * rect.h as f64;
            (px as i32, py as i32)
        };

        for &(a, b) in skeleton.segments.iter() {
            let (x1, y1) = to_pixel(a);
            let (x2, y2) = to_pixel(b);
            self.draw_line(x1, y1, x2, y2, BONE_COLOR);
        }

        for &p in skeleton.points.iter() {
            let (px, py) = to_pixel(p);
            self.draw_circle(px, py, 3, POINT_COLOR);
        }
    }

    /// 関節高さチャートを描画。縦軸は0〜100に固定。
    pub fn draw_chart(&mut self, chart: &MotionChart, rect: Rect) {
        self.draw_border(rect);
        if chart.is_empty() {
            return;
        }

        let (t0, t1) = chart.x_range();
        let span = (t1 - t0).max(f64::EPSILON);
        let to_pixel = |t: f64, value: f64| {
            let px = rect.x as f64 + (t - t0) / span * rect.w as f64;
            let py = rect.y as f64 + (1.0 - (value / 100.0).clamp(0.0, 1.0)) * rect.h as f64;
            (px as i32, py as i32)
        };

        for channel in 0..CHART_JOINTS.len() {
            let color = CHANNEL_COLORS[channel];
            let samples = chart.visible(channel);
            for pair in samples.windows(2) {
                let (x1, y1) = to_pixel(pair[0].0, pair[0].1);
                let (x2, y2) = to_pixel(pair[1].0, pair[1].1);
                self.draw_line(x1, y1, x2, y2, color);
            }
        }
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    fn draw_border(&mut self, rect: Rect) {
        let x1 = (rect.x + rect.w) as i32 - 1;
        let y1 = (rect.y + rect.h) as i32 - 1;
        self.draw_line(rect.x as i32, rect.y as i32, x1, rect.y as i32, PANEL_BORDER_COLOR);
        self.draw_line(rect.x as i32, y1, x1, y1, PANEL_BORDER_COLOR);
        self.draw_line(rect.x as i32, rect.y as i32, rect.x as i32, y1, PANEL_BORDER_COLOR);
        self.draw_line(x1, rect.y as i32, x1, y1, PANEL_BORDER_COLOR);
    }

    /// Bresenhamのアルゴリズムで線を描画
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}
