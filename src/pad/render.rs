use crate::pad::input::CurveSegment;
use crate::pad::options::{LineCap, PadColor};
use image::imageops::FilterType;
use image::RgbaImage;

/// The raster drawing surface.
///
/// Pixels are straight-alpha RGBA at `logical size × scale` resolution; the
/// buffer starts fully transparent and is mutated incrementally as segments
/// arrive. All drawing goes through soft-edged circle stamps, which keeps
/// joins round and bounds handling in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    scale: f32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(logical_width: f32, logical_height: f32, scale: f32) -> Self {
        let width = (logical_width.max(1.0) * scale).round().max(1.0) as u32;
        let height = (logical_height.max(1.0) * scale).round().max(1.0) as u32;
        Self {
            width,
            height,
            scale,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (self.width as f32 / self.scale, self.height as f32 / self.scale)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// No pixel has been touched since the last clear.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Resize the surface, keeping a scaled copy of the current content.
    pub fn resize_preserving(&mut self, logical_width: f32, logical_height: f32, scale: f32) {
        let next = Self::new(logical_width, logical_height, scale);
        if next.width == self.width && next.height == self.height {
            self.scale = scale;
            return;
        }
        if self.is_blank() {
            *self = next;
            return;
        }
        match self.to_image() {
            Some(img) => {
                let scaled = image::imageops::resize(&img, next.width, next.height, FilterType::Triangle);
                self.pixels = scaled.into_raw();
                self.width = next.width;
                self.height = next.height;
                self.scale = scale;
            }
            None => *self = next,
        }
    }

    /// Filled dot for a tap, `diameter` in logical units.
    pub fn draw_dot(&mut self, center: (f32, f32), diameter: f32, color: PadColor) {
        let radius = (diameter * self.scale / 2.0).max(0.5);
        self.stamp(center.0 * self.scale, center.1 * self.scale, radius, color);
    }

    /// Rasterize one smoothed quadratic segment by stamping along the
    /// flattened curve, interpolating thickness between the endpoints.
    pub fn draw_curve(&mut self, segment: &CurveSegment, color: PadColor) {
        let from = (segment.from.0 * self.scale, segment.from.1 * self.scale);
        let control = (segment.control.0 * self.scale, segment.control.1 * self.scale);
        let to = (segment.to.0 * self.scale, segment.to.1 * self.scale);

        let approx_len = hypot(control.0 - from.0, control.1 - from.1)
            + hypot(to.0 - control.0, to.1 - control.1);
        let steps = approx_len.ceil().max(1.0) as i32;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let u = 1.0 - t;
            let x = u * u * from.0 + 2.0 * u * t * control.0 + t * t * to.0;
            let y = u * u * from.1 + 2.0 * u * t * control.1 + t * t * to.1;
            let width = segment.start_width + (segment.end_width - segment.start_width) * t;
            let radius = (width * self.scale / 2.0).max(0.5);
            self.stamp(x, y, radius, color);
        }
    }

    /// End-of-stroke cap. Joins are inherently round under stamping, so only
    /// the stroke endpoints carry the configured cap.
    pub fn draw_cap(&mut self, center: (f32, f32), width: f32, cap: LineCap, color: PadColor) {
        match cap {
            LineCap::Butt => {}
            LineCap::Round => self.draw_dot(center, width, color),
            LineCap::Square => {
                let half = (width * self.scale / 2.0).max(0.5);
                self.stamp_square(center.0 * self.scale, center.1 * self.scale, half, color);
            }
        }
    }

    fn stamp(&mut self, cx: f32, cy: f32, radius: f32, color: PadColor) {
        let min_x = (cx - radius - 1.0).floor() as i32;
        let max_x = (cx + radius + 1.0).ceil() as i32;
        let min_y = (cy - radius - 1.0).floor() as i32;
        let max_y = (cy + radius + 1.0).ceil() as i32;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color, coverage);
                }
            }
        }
    }

    fn stamp_square(&mut self, cx: f32, cy: f32, half: f32, color: PadColor) {
        let min_x = (cx - half).floor() as i32;
        let max_x = (cx + half).ceil() as i32;
        let min_y = (cy - half).floor() as i32;
        let max_y = (cy + half).ceil() as i32;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: PadColor, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let src_a = (color.a as f32 / 255.0) * coverage;
        if src_a <= 0.0 {
            return;
        }

        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let dst = &mut self.pixels[idx..idx + 4];
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= f32::EPSILON {
            return;
        }

        let blend = |src: u8, dst: u8| -> u8 {
            (((src as f32 * src_a) + (dst as f32 * dst_a * (1.0 - src_a))) / out_a)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        dst[0] = blend(color.r, dst[0]);
        dst[1] = blend(color.g, dst[1]);
        dst[2] = blend(color.b, dst[2]);
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn hypot(dx: f32, dy: f32) -> f32 {
    (dx * dx + dy * dy).sqrt()
}
