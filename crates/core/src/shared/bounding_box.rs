use serde::{Deserialize, Serialize};

/// Face location within its source image, normalized to `[0, 1]` by the
/// image width (x, width) and height (y, height).
///
/// Normalized coordinates keep provenance independent of the resolution
/// the detector happened to run at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub width: f32,
    pub height: f32,
}

/// Pixel rectangle `(x, y, width, height)`.
pub type PixelRect = (u32, u32, u32, u32);

impl BoundingBox {
    /// Builds a box clamped to the unit square. Non-finite inputs count as 0.
    pub fn new(x_min: f32, y_min: f32, width: f32, height: f32) -> Self {
        let x_min = unit(x_min);
        let y_min = unit(y_min);
        Self {
            x_min,
            y_min,
            width: unit(width).min(1.0 - x_min),
            height: unit(height).min(1.0 - y_min),
        }
    }

    /// Builds a box from pixel corners `(x1, y1)`–`(x2, y2)` of a
    /// `frame_width × frame_height` image.
    pub fn from_pixel_corners(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        if frame_width == 0 || frame_height == 0 {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        }
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        Self::new(
            (x1 / fw) as f32,
            (y1 / fh) as f32,
            ((x2 - x1) / fw) as f32,
            ((y2 - y1) / fh) as f32,
        )
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x_min.max(other.x_min);
        let iy1 = self.y_min.max(other.y_min);
        let ix2 = (self.x_min + self.width).min(other.x_min + other.width);
        let iy2 = (self.y_min + self.height).min(other.y_min + other.height);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Pixel rectangle in a `frame_width × frame_height` image, grown by
    /// `margin` pixels on every side and clipped to the image.
    pub fn to_pixel_rect(&self, frame_width: u32, frame_height: u32, margin: u32) -> PixelRect {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        let m = margin as f64;

        let x1 = (self.x_min as f64 * fw - m).max(0.0);
        let y1 = (self.y_min as f64 * fh - m).max(0.0);
        let x2 = ((self.x_min + self.width) as f64 * fw + m).min(fw);
        let y2 = ((self.y_min + self.height) as f64 * fh + m).min(fh);

        let x = x1.floor() as u32;
        let y = y1.floor() as u32;
        let w = (x2.ceil() as u32).saturating_sub(x);
        let h = (y2.ceil() as u32).saturating_sub(y);
        (x, y, w, h)
    }
}

fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
