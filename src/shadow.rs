//! Soft drop shadow rendered into a separate layered window.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BalloonError, ErrorKey, ErrorMessages, Result};
use crate::geometry::{Point, PointF, Rect, Size};
use crate::host::{Host, WindowId, WindowKind};
use crate::outline::Outline;
use crate::region::Region;
use crate::render::{fill_region_with, Bitmap, Color, RgbaBuffer};

pub const DEFAULT_SHADOW_MARGIN: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub color: Color,
    pub margin: i32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::BLACK,
            margin: DEFAULT_SHADOW_MARGIN,
        }
    }
}

/// Renders the shadow of `outline` for a window of `size`.
///
/// The fill is a path gradient centered on the window origin: solid `color`
/// inside the outline scaled by `1 - 2 * margin / width`, fading to fully
/// transparent at the outline. Pixels the owner covers (the outline moved
/// back by `margin`) are left clear so only the offset ring shows.
pub fn render_shadow(outline: &Outline, size: Size, color: Color, margin: i32) -> RgbaBuffer {
    let mut buffer = RgbaBuffer::new(
        size.width.max(0) as u32,
        size.height.max(0) as u32,
        Color::TRANSPARENT,
    );
    if size.is_empty() || outline.is_empty() {
        return buffer;
    }
    let bounds = Rect::new(0, 0, size.width, size.height);
    let owner = Region::fill(outline).translate(-margin, -margin);
    let clip = Region::from_rect(bounds).xor(&owner);
    let paint = Region::fill(outline).intersect(&clip);

    let polygon = outline.polygon();
    let focus = (1.0 - (margin as f64 * 2.0) / size.width as f64).clamp(0.0, 1.0);
    let center = PointF::new(0.0, 0.0);
    fill_region_with(&mut buffer, &paint, |x, y| {
        let p = PointF::new(x as f64 + 0.5, y as f64 + 0.5);
        let t = gradient_position(&polygon, center, p);
        if t <= focus {
            color
        } else if focus >= 1.0 {
            Color::TRANSPARENT
        } else {
            let fade = ((1.0 - t) / (1.0 - focus)).clamp(0.0, 1.0);
            color.with_alpha((color.a as f64 * fade).round() as u8)
        }
    });
    buffer
}

/// Fraction of the way from `center` to the outline boundary along the ray
/// through `p`. 1.0 when the ray leaves the outline at `p` or never meets it.
fn gradient_position(polygon: &[PointF], center: PointF, p: PointF) -> f64 {
    let d = PointF::new(p.x - center.x, p.y - center.y);
    if d.x == 0.0 && d.y == 0.0 {
        return 0.0;
    }
    let n = polygon.len();
    let mut nearest: Option<f64> = None;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let e = PointF::new(b.x - a.x, b.y - a.y);
        let denom = d.x * e.y - d.y * e.x;
        if denom.abs() < f64::EPSILON {
            continue;
        }
        let ac = PointF::new(a.x - center.x, a.y - center.y);
        let u = (ac.x * e.y - ac.y * e.x) / denom;
        let v = (ac.x * d.y - ac.y * d.x) / denom;
        if !(0.0..=1.0).contains(&v) || u < 1.0 - 1e-9 {
            continue;
        }
        nearest = Some(nearest.map_or(u, |best: f64| best.min(u)));
    }
    nearest.map_or(1.0, |u| 1.0 / u)
}

/// Shadow window that follows its owner.
///
/// The window is created on first show and kept (hidden) until
/// [`release`](Self::release). The rendered bitmap is kept between moves so
/// repositioning does not repaint.
#[derive(Debug)]
pub struct ShadowProjection {
    settings: ShadowSettings,
    window: Option<WindowId>,
    visible: bool,
    location: Point,
    size: Size,
    outline: Option<Outline>,
    bitmap: Option<Bitmap>,
}

impl ShadowProjection {
    pub fn new(settings: ShadowSettings) -> Self {
        Self {
            settings,
            window: None,
            visible: false,
            location: Point::default(),
            size: Size::default(),
            outline: None,
            bitmap: None,
        }
    }

    pub fn settings(&self) -> ShadowSettings {
        self.settings
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    fn owner_offset(&self, owner_location: Point) -> Point {
        owner_location.offset(self.settings.margin, self.settings.margin)
    }

    fn ensure_window(&mut self, host: &mut dyn Host) -> Result<WindowId> {
        if let Some(id) = self.window {
            return Ok(id);
        }
        let id = host.create_window(WindowKind::Shadow)?;
        debug!(window = id.0, "shadow window created");
        self.window = Some(id);
        Ok(id)
    }

    pub fn show(
        &mut self,
        host: &mut dyn Host,
        messages: &dyn ErrorMessages,
        owner_location: Point,
        owner_size: Size,
        outline: &Outline,
    ) -> Result<()> {
        let id = self.ensure_window(host)?;
        self.location = self.owner_offset(owner_location);
        self.size = owner_size;
        host.set_window_bounds(id, Rect::from_location_size(self.location, self.size))?;
        let stale = self.bitmap.as_ref().map_or(true, |b| {
            b.width != owner_size.width as u32 || b.height != owner_size.height as u32
        });
        if self.outline.as_ref() != Some(outline) || stale {
            self.outline = Some(outline.clone());
            self.rerender();
        }
        self.present_current(host, messages)?;
        host.set_window_visible(id, true)?;
        self.visible = true;
        Ok(())
    }

    pub fn hide(&mut self, host: &mut dyn Host) -> Result<()> {
        if let Some(id) = self.window {
            if self.visible {
                host.set_window_visible(id, false)?;
            }
        }
        self.visible = false;
        Ok(())
    }

    /// Destroys the shadow window.
    pub fn release(&mut self, host: &mut dyn Host) {
        if let Some(id) = self.window.take() {
            host.destroy_window(id);
            debug!(window = id.0, "shadow window destroyed");
        }
        self.visible = false;
        self.bitmap = None;
    }

    pub fn on_owner_outline_changed(
        &mut self,
        host: &mut dyn Host,
        messages: &dyn ErrorMessages,
        outline: &Outline,
    ) -> Result<()> {
        if self.outline.as_ref() == Some(outline) {
            return Ok(());
        }
        self.outline = Some(outline.clone());
        self.rerender();
        if self.visible {
            self.present_current(host, messages)?;
        }
        Ok(())
    }

    pub fn on_owner_moved(&mut self, host: &mut dyn Host, owner_location: Point) -> Result<()> {
        self.location = self.owner_offset(owner_location);
        if let Some(id) = self.window {
            host.set_window_bounds(id, Rect::from_location_size(self.location, self.size))?;
        }
        Ok(())
    }

    pub fn on_owner_resized(&mut self, host: &mut dyn Host, owner_size: Size) -> Result<()> {
        if self.size == owner_size {
            return Ok(());
        }
        self.size = owner_size;
        if let Some(id) = self.window {
            host.set_window_bounds(id, Rect::from_location_size(self.location, self.size))?;
        }
        Ok(())
    }

    /// Applies new settings; color and margin changes re-render.
    pub fn update_settings(
        &mut self,
        host: &mut dyn Host,
        messages: &dyn ErrorMessages,
        settings: ShadowSettings,
        owner_location: Point,
    ) -> Result<()> {
        let changed = settings.color != self.settings.color || settings.margin != self.settings.margin;
        self.settings = settings;
        if changed {
            self.rerender();
            self.on_owner_moved(host, owner_location)?;
            if self.visible {
                self.present_current(host, messages)?;
            }
        }
        Ok(())
    }

    fn rerender(&mut self) {
        self.bitmap = self.outline.as_ref().map(|outline| {
            Bitmap::from_rgba(&render_shadow(
                outline,
                self.size,
                self.settings.color,
                self.settings.margin,
            ))
        });
    }

    fn present_current(&mut self, host: &mut dyn Host, messages: &dyn ErrorMessages) -> Result<()> {
        let Some(bitmap) = self.bitmap.take() else {
            return Ok(());
        };
        let result = self.present(host, messages, &bitmap);
        self.bitmap = Some(bitmap);
        result
    }

    /// Hands `bitmap` to the layered window at full opacity.
    ///
    /// Anything but premultiplied 32bpp with alpha is rejected before the host
    /// sees it.
    pub fn present(&mut self, host: &mut dyn Host, messages: &dyn ErrorMessages, bitmap: &Bitmap) -> Result<()> {
        if !bitmap.format.has_alpha() {
            warn!(format = ?bitmap.format, "shadow bitmap rejected");
            return Err(BalloonError::composition(
                messages,
                ErrorKey::PixelFormat,
                format!("{:?}", bitmap.format),
            ));
        }
        let id = self.ensure_window(host)?;
        host.update_layered(id, self.location, bitmap, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_outline, LayoutState};

    fn outline(size: Size) -> Outline {
        compute_outline(&LayoutState::default(), Rect::new(0, 0, size.width, size.height))
            .unwrap()
            .outline
    }

    #[test]
    fn shadow_is_only_drawn_outside_the_owner() {
        let size = Size::new(120, 80);
        let buffer = render_shadow(&outline(size), size, Color::BLACK, 5);
        // Covered by the owner window.
        assert_eq!(buffer.pixel(40, 40).a, 0);
        // Lower-right ring, not covered by the owner.
        let ring = buffer.pixel(116, 50);
        assert!(ring.a > 0);
        assert_eq!((ring.r, ring.g, ring.b), (0, 0, 0));
    }

    #[test]
    fn gradient_fades_toward_the_outline() {
        let size = Size::new(120, 80);
        let buffer = render_shadow(&outline(size), size, Color::BLACK, 20);
        let inner = buffer.pixel(100, 70).a;
        let outer = buffer.pixel(118, 78).a;
        assert!(inner >= outer, "inner {inner} outer {outer}");
    }

    #[test]
    fn gradient_position_is_relative_to_boundary() {
        let square = [
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 0.0),
            PointF::new(10.0, 10.0),
            PointF::new(0.0, 10.0),
        ];
        let t = gradient_position(&square, PointF::new(0.0, 0.0), PointF::new(5.0, 5.0));
        assert!((t - 0.5).abs() < 1e-9);
    }
}
