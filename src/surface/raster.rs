use egui::{Color32, Pos2};
use image::{imageops, Rgba, RgbaImage};

use super::{DrawableSurface, SurfaceSize};
use crate::smoothing::Segment;

/// Maximum spacing between disc stamps along a curve, in physical pixels
const STAMP_SPACING: f32 = 0.5;
const MAX_STAMPS: usize = 16_384;

/// Software surface backed by an RGBA pixel buffer
///
/// Segments are rasterized by stamping anti-aliased discs along the curve into
/// a coverage mask and compositing the mask once, so overlapping stamps within a
/// segment never darken the edges.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    size: SurfaceSize,
    pixel_ratio: f32,
    image: RgbaImage,
    /// Bumped on every mutation, used to invalidate textures
    revision: u64,
}

impl RasterSurface {
    pub fn new(size: SurfaceSize, pixel_ratio: f32) -> Self {
        let (width, height) = size.physical(pixel_ratio);
        Self {
            size,
            pixel_ratio,
            image: RgbaImage::new(width, height),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn to_physical(&self, pos: Pos2) -> Pos2 {
        Pos2::new(pos.x * self.pixel_ratio, pos.y * self.pixel_ratio)
    }
}

impl DrawableSurface for RasterSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn resize(&mut self, size: SurfaceSize, pixel_ratio: f32) {
        let (width, height) = size.physical(pixel_ratio);
        self.size = size;
        self.pixel_ratio = pixel_ratio;
        self.image = RgbaImage::new(width, height);
        self.touch();
    }

    fn clear(&mut self, color: Color32) {
        let fill = Rgba(color.to_srgba_unmultiplied());
        for pixel in self.image.pixels_mut() {
            *pixel = fill;
        }
        self.touch();
    }

    fn draw_segment(&mut self, segment: &Segment, color: Color32) {
        let scale = self.pixel_ratio;
        let (img_w, img_h) = self.image.dimensions();

        let bounds = segment.bounds();
        let min = self.to_physical(bounds.min);
        let max = self.to_physical(bounds.max);
        let x0 = (min.x.floor() - 1.0).max(0.0) as u32;
        let y0 = (min.y.floor() - 1.0).max(0.0) as u32;
        let x1 = ((max.x.ceil() + 1.0).max(0.0) as u32).min(img_w);
        let y1 = ((max.y.ceil() + 1.0).max(0.0) as u32).min(img_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let mask_w = (x1 - x0) as usize;
        let mut mask = vec![0.0f32; mask_w * (y1 - y0) as usize];

        let steps = if segment.is_dot() {
            0
        } else {
            ((segment.approx_length() * scale / STAMP_SPACING).ceil() as usize).clamp(1, MAX_STAMPS)
        };

        for i in 0..=steps {
            let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            let center = self.to_physical(segment.point_at(t));
            let radius = segment.width_at(t) * scale * 0.5;

            let sx0 = ((center.x - radius - 1.0).floor().max(x0 as f32)) as u32;
            let sy0 = ((center.y - radius - 1.0).floor().max(y0 as f32)) as u32;
            let sx1 = ((center.x + radius + 1.0).ceil().max(0.0) as u32).min(x1);
            let sy1 = ((center.y + radius + 1.0).ceil().max(0.0) as u32).min(y1);

            for py in sy0..sy1 {
                for px in sx0..sx1 {
                    let d = Pos2::new(px as f32 + 0.5, py as f32 + 0.5).distance(center);
                    let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                    let idx = (py - y0) as usize * mask_w + (px - x0) as usize;
                    if coverage > mask[idx] {
                        mask[idx] = coverage;
                    }
                }
            }
        }

        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let src_alpha = a as f32 / 255.0;
        for py in y0..y1 {
            for px in x0..x1 {
                let coverage = mask[(py - y0) as usize * mask_w + (px - x0) as usize];
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(px, py);
                *pixel = blend_over(*pixel, [r, g, b], src_alpha * coverage);
            }
        }
        self.touch();
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (width, height) = self.image.dimensions();
        if image.dimensions() == (width, height) {
            imageops::overlay(&mut self.image, image, 0, 0);
        } else {
            let scaled = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            imageops::overlay(&mut self.image, &scaled, 0, 0);
        }
        self.touch();
    }

    fn pixels(&self) -> &RgbaImage {
        &self.image
    }
}

/// Straight-alpha source-over compositing
fn blend_over(dst: Rgba<u8>, src: [u8; 3], src_alpha: f32) -> Rgba<u8> {
    let [dr, dg, db, da] = dst.0;
    let dst_alpha = da as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| {
        let v = (s as f32 * src_alpha + d as f32 * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dr),
        channel(src[1], dg),
        channel(src[2], db),
        (out_alpha * 255.0).round() as u8,
    ])
}
