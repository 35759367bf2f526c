#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn aspect(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn physical(&self) -> [u32; 2] {
        let scale = if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        [
            ((self.width as f32) * scale).round().max(1.0) as u32,
            ((self.height as f32) * scale).round().max(1.0) as u32,
        ]
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(800, 600, 1.0)
    }
}
