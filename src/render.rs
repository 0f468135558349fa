use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Pale yellow used for balloon backgrounds.
    pub const INFO: Self = Self::rgb(255, 255, 225);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Straight-alpha RGBA pixels, row major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[0] = fill.r;
            chunk[1] = fill.g;
            chunk[2] = fill.b;
            chunk[3] = fill.a;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(((y as u32 * self.width + x as u32) * 4) as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    /// Overwrites a pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = color.r;
            self.pixels[idx + 1] = color.g;
            self.pixels[idx + 2] = color.b;
            self.pixels[idx + 3] = color.a;
        }
    }

    /// Source-over blends `color` onto a pixel. Out-of-bounds writes are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            let bottom = Color::rgba(
                self.pixels[idx],
                self.pixels[idx + 1],
                self.pixels[idx + 2],
                self.pixels[idx + 3],
            );
            let out = blend_over(bottom, color);
            self.pixels[idx] = out.r;
            self.pixels[idx + 1] = out.g;
            self.pixels[idx + 2] = out.b;
            self.pixels[idx + 3] = out.a;
        }
    }
}

fn blend_over(bottom: Color, top: Color) -> Color {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

/// Fills every pixel of `region` with `color`, blending over what is there.
pub fn fill_region(buffer: &mut RgbaBuffer, region: &Region, color: Color) {
    fill_region_with(buffer, region, |_, _| color);
}

/// Fills `region` with a per-pixel color.
pub fn fill_region_with<F>(buffer: &mut RgbaBuffer, region: &Region, mut shade: F)
where
    F: FnMut(i32, i32) -> Color,
{
    let clip = buffer.bounds();
    for span in region.spans() {
        let span = span.intersect(clip);
        if span.is_empty() {
            continue;
        }
        for x in span.left()..span.right() {
            let color = shade(x, span.y);
            if color.a > 0 {
                buffer.blend_pixel(x, span.y, color);
            }
        }
    }
}

/// Scales `image` into `dest` and blends it, limited to `clip`.
pub fn draw_image(buffer: &mut RgbaBuffer, image: &RgbaImage, dest: Rect, clip: &Region) {
    if dest.is_empty() || image.width() == 0 || image.height() == 0 {
        return;
    }
    let scaled = if image.width() == dest.width as u32 && image.height() == dest.height as u32 {
        image.clone()
    } else {
        imageops::resize(image, dest.width as u32, dest.height as u32, FilterType::Triangle)
    };
    let visible = clip.clip(dest);
    fill_region_with(buffer, &visible, |x, y| {
        let px = scaled.get_pixel((x - dest.x) as u32, (y - dest.y) as u32);
        Color::rgba(px[0], px[1], px[2], px[3])
    });
}

/// Layout of the bytes in a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32 bits per pixel, premultiplied BGRA with a real alpha channel.
    Argb32,
    /// 32 bits per pixel, BGRX; the fourth byte is ignored.
    Rgb32,
    /// 24 bits per pixel BGR.
    Rgb24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Argb32 | PixelFormat::Rgb32 => 4,
            PixelFormat::Rgb24 => 3,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Argb32)
    }
}

/// Device-ready pixels handed to the host for layered composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * format.bytes_per_pixel()],
        }
    }

    /// Premultiplied 32bpp BGRA copy of `buffer`.
    pub fn from_rgba(buffer: &RgbaBuffer) -> Self {
        let mut data = vec![0u8; buffer.pixels.len()];
        convert_rgba_to_premultiplied_bgra(&buffer.pixels, &mut data);
        Self {
            width: buffer.width,
            height: buffer.height,
            format: PixelFormat::Argb32,
            data,
        }
    }
}

pub fn convert_rgba_to_dib_bgra(rgba: &[u8], dib_bgra: &mut [u8]) {
    assert_eq!(rgba.len(), dib_bgra.len());
    for (src, dst) in rgba.chunks_exact(4).zip(dib_bgra.chunks_exact_mut(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
        dst[3] = src[3];
    }
}

/// Same channel swap as [`convert_rgba_to_dib_bgra`] with color scaled by
/// alpha, which is what `UpdateLayeredWindow` expects with `AC_SRC_ALPHA`.
pub fn convert_rgba_to_premultiplied_bgra(rgba: &[u8], dib_bgra: &mut [u8]) {
    assert_eq!(rgba.len(), dib_bgra.len());
    for (src, dst) in rgba.chunks_exact(4).zip(dib_bgra.chunks_exact_mut(4)) {
        let a = src[3] as u16;
        let premul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        dst[0] = premul(src[2]);
        dst[1] = premul(src[1]);
        dst[2] = premul(src[0]);
        dst[3] = src[3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blending_half_alpha_over_opaque() {
        let mut buffer = RgbaBuffer::from_pixels(1, 1, vec![100, 100, 100, 255]);
        buffer.blend_pixel(0, 0, Color::rgba(200, 0, 0, 128));
        assert_eq!(buffer.pixel(0, 0), Color::rgba(150, 50, 50, 255));
    }

    #[test]
    fn dib_upload_converts_channel_order_correctly() {
        let rgba = vec![10, 20, 30, 40, 50, 60, 70, 80];
        let mut bgra = vec![0; rgba.len()];
        convert_rgba_to_dib_bgra(&rgba, &mut bgra);
        assert_eq!(bgra, vec![30, 20, 10, 40, 70, 60, 50, 80]);
    }

    #[test]
    fn premultiplied_upload_scales_by_alpha() {
        let rgba = vec![255, 128, 0, 128, 10, 20, 30, 0];
        let mut bgra = vec![0; rgba.len()];
        convert_rgba_to_premultiplied_bgra(&rgba, &mut bgra);
        assert_eq!(bgra, vec![0, 64, 128, 128, 0, 0, 0, 0]);
    }

    #[test]
    fn fill_region_is_clipped_to_the_buffer() {
        let mut buffer = RgbaBuffer::new(4, 4, Color::TRANSPARENT);
        let region = Region::from_rect(Rect::new(2, 2, 10, 10));
        fill_region(&mut buffer, &region, Color::BLACK);
        assert_eq!(buffer.pixel(3, 3), Color::BLACK);
        assert_eq!(buffer.pixel(1, 1), Color::TRANSPARENT);
    }

    #[test]
    fn image_is_scaled_into_destination() {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        let mut buffer = RgbaBuffer::new(8, 8, Color::WHITE);
        let clip = Region::from_rect(buffer.bounds());
        draw_image(&mut buffer, &image, Rect::new(1, 1, 4, 4), &clip);
        assert_eq!(buffer.pixel(2, 2), Color::rgb(0, 0, 255));
        assert_eq!(buffer.pixel(6, 6), Color::WHITE);
    }
}
