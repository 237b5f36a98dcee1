//! Pixel operations the detector and recognizer need
//!
//! Frames are `image` buffers: [`RgbFrame`] for colour, [`GrayImage`] for
//! the binarized sign handed to the recognizer. Thresholding and the
//! recognizer upscale come from `imageproc` and `image::imageops`; the
//! detector input is resampled here so it lines up with the model's
//! training-time resize.

use abus_common::config::ChannelOrder;
use image::imageops::{self, FilterType};
use image::{Luma, Rgb, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::map::map_colors;

pub use image::GrayImage;

/// Interleaved 8-bit RGB frame
pub type RgbFrame = RgbImage;

/// Axis-aligned box, corner form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    /// Scale both axes independently (model space → frame space)
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}

/// Gamma lookup table: `255 * (i/255)^(1/gamma)`, truncated
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv = 1.0 / gamma as f64;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = ((i as f64 / 255.0).powf(inv) * 255.0) as u8;
    }
    lut
}

pub fn apply_lut(frame: &mut RgbFrame, lut: &[u8; 256]) {
    for Rgb(px) in frame.pixels_mut() {
        for v in px.iter_mut() {
            *v = lut[*v as usize];
        }
    }
}

/// Multiply HSV saturation by `factor`, clipping at full saturation
pub fn boost_saturation(frame: &mut RgbFrame, factor: f32) {
    for px in frame.pixels_mut() {
        let [r, g, b] = px.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        *px = Rgb(hsv_to_rgb(h, (s * factor).min(1.0), v));
    }
}

/// RGB → (hue degrees, saturation 0..1, value 0..1)
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Centre-aligned source coordinate for resampling
fn source_coord(dst: u32, ratio: f32) -> f32 {
    ((dst as f32 + 0.5) * ratio - 0.5).max(0.0)
}

/// Bilinear resize with replicated borders
///
/// Same sampling grid as OpenCV's `INTER_LINEAR`, which the detector was
/// trained behind; `imageops::resize` widens its kernel when shrinking.
pub fn resize_bilinear(src: &RgbFrame, dst_w: u32, dst_h: u32) -> RgbFrame {
    let (src_w, src_h) = src.dimensions();
    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    RgbFrame::from_fn(dst_w, dst_h, |dx, dy| {
        let sy = source_coord(dy, y_ratio);
        let sy0 = (sy.floor() as u32).min(src_h - 1);
        let sy1 = (sy0 + 1).min(src_h - 1);
        let fy = sy - sy0 as f32;

        let sx = source_coord(dx, x_ratio);
        let sx0 = (sx.floor() as u32).min(src_w - 1);
        let sx1 = (sx0 + 1).min(src_w - 1);
        let fx = sx - sx0 as f32;

        let (p00, p10) = (src.get_pixel(sx0, sy0), src.get_pixel(sx1, sy0));
        let (p01, p11) = (src.get_pixel(sx0, sy1), src.get_pixel(sx1, sy1));

        let mut out = [0u8; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            let val = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
                + p10[c] as f32 * fx * (1.0 - fy)
                + p01[c] as f32 * (1.0 - fx) * fy
                + p11[c] as f32 * fx * fy;
            *slot = val.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// Normalize [0, 255] -> [0, 1] and convert HWC -> CHW, planes in `order`
pub fn to_chw_tensor(frame: &RgbFrame, order: ChannelOrder) -> Vec<f32> {
    let channels: [usize; 3] = match order {
        ChannelOrder::Rgb => [0, 1, 2],
        ChannelOrder::Bgr => [2, 1, 0],
    };
    let plane = (frame.width() * frame.height()) as usize;
    let mut out = vec![0.0f32; 3 * plane];
    for (i, px) in frame.pixels().enumerate() {
        for (p, &c) in channels.iter().enumerate() {
            out[p * plane + i] = px[c] as f32 / 255.0;
        }
    }
    out
}

/// Cut out `bbox`, clamped to the frame; `None` when nothing is left
pub fn crop(frame: &RgbFrame, bbox: &BoundingBox) -> Option<RgbFrame> {
    let clamp_x = |v: f32| v.max(0.0).min(frame.width() as f32) as u32;
    let clamp_y = |v: f32| v.max(0.0).min(frame.height() as f32) as u32;
    let (x1, x2) = (clamp_x(bbox.x1), clamp_x(bbox.x2));
    let (y1, y2) = (clamp_y(bbox.y1), clamp_y(bbox.y2));
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(imageops::crop_imm(frame, x1, y1, x2 - x1, y2 - y1).to_image())
}

/// ITU-R BT.601 luma, as OpenCV's `RGB2GRAY`
pub fn to_gray(frame: &RgbFrame) -> GrayImage {
    map_colors(frame, |Rgb([r, g, b])| {
        let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([y.round() as u8])
    })
}

/// Recognizer input: 2× bicubic upscale, then an inverted Otsu threshold
///
/// Dark strokes on a light plate come out white on black.
pub fn binarize_for_ocr(roi: &RgbFrame) -> GrayImage {
    let gray = to_gray(roi);
    let upscaled = imageops::resize(
        &gray,
        gray.width() * 2,
        gray.height() * 2,
        FilterType::CatmullRom,
    );
    threshold(&upscaled, otsu_level(&upscaled), ThresholdType::BinaryInverted)
}
