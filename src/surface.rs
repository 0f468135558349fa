//! Shaped window surface: outline cache, window region and painting.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{BalloonError, ErrorKey, ErrorMessages, Result};
use crate::geometry::{Rect, Size};
use crate::outline::Outline;
use crate::region::Region;
use crate::render::{draw_image, fill_region, fill_region_with, Color, RgbaBuffer};

/// How the interior of the outline is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackStyle {
    /// Flat fill with the surface's back color.
    Solid,
    VerticalGradient { top: Color, bottom: Color },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStyle {
    pub back_color: Color,
    pub back_style: BackStyle,
    pub border_color: Color,
    /// Nominal pen width; the stroke drawn is `2 * width - 1` pixels, centered on the outline.
    pub border_width: u32,
    pub background_image: Option<RgbaImage>,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            back_color: Color::INFO,
            back_style: BackStyle::Solid,
            border_color: Color::BLACK,
            border_width: 1,
            background_image: None,
        }
    }
}

/// One painted frame, ready for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub region: Region,
    pub pixels: RgbaBuffer,
}

/// Caches a window's outline and turns it into a region and pixels.
///
/// The outline is dropped on [`invalidate`](Self::invalidate) or on resize.
/// The owning window lays out a fresh one before its next paint.
#[derive(Debug, Clone)]
pub struct ShapedSurface {
    size: Size,
    outline: Option<Outline>,
    style: SurfaceStyle,
}

impl ShapedSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            outline: None,
            style: SurfaceStyle::default(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns `true` if the size changed, in which case the outline is dropped.
    pub fn resize(&mut self, size: Size) -> bool {
        if self.size == size {
            return false;
        }
        self.size = size;
        self.invalidate();
        true
    }

    pub fn invalidate(&mut self) {
        self.outline = None;
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    /// Replaces the outline. Returns `true` when it differs from the cached one.
    pub fn set_outline(&mut self, outline: Outline) -> bool {
        if self.outline.as_ref() == Some(&outline) {
            return false;
        }
        self.outline = Some(outline);
        true
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut SurfaceStyle {
        &mut self.style
    }

    fn local_bounds(&self) -> Rect {
        Rect::new(0, 0, self.size.width, self.size.height)
    }

    /// Window region: the widened outline clipped to the window.
    pub fn region(&self) -> Option<Region> {
        self.outline
            .as_ref()
            .map(|outline| Region::from_outline(outline).clip(self.local_bounds()))
    }

    /// Paints background, background image and border, in that order.
    pub fn paint(&self, messages: &dyn ErrorMessages) -> Result<Frame> {
        let (Some(outline), Some(region)) = (self.outline.as_ref(), self.region()) else {
            return Err(BalloonError::invalid_state(
                messages,
                ErrorKey::MissingOutline,
                "paint",
            ));
        };
        if self.size.is_empty() {
            return Err(BalloonError::invalid_argument(
                messages,
                "size",
                ErrorKey::EmptyBounds,
                format!("{}x{}", self.size.width, self.size.height),
            ));
        }
        let bounds = self.local_bounds();
        let mut pixels = RgbaBuffer::new(
            self.size.width as u32,
            self.size.height as u32,
            Color::TRANSPARENT,
        );

        let interior = Region::fill(outline).clip(bounds);
        match self.style.back_style {
            BackStyle::Solid => fill_region(&mut pixels, &interior, self.style.back_color),
            BackStyle::VerticalGradient { top, bottom } => {
                let span = (self.size.height - 1).max(1) as f64;
                fill_region_with(&mut pixels, &interior, |_, y| top.lerp(bottom, y as f64 / span));
            }
        }

        if let Some(image) = self.style.background_image.as_ref() {
            let dest = Rect::new(0, 0, self.size.width - 1, self.size.height - 1);
            draw_image(&mut pixels, image, dest, &interior);
        }

        let pen = (self.style.border_width.max(1) * 2 - 1) as f64;
        let border = Region::stroke(outline, pen).clip(bounds);
        fill_region(&mut pixels, &border, self.style.border_color);

        Ok(Frame { region, pixels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DefaultErrorMessages;
    use crate::layout::{compute_outline, LayoutState};

    fn surface() -> ShapedSurface {
        let mut surface = ShapedSurface::new(Size::new(120, 80));
        let shape = compute_outline(&LayoutState::default(), Rect::new(0, 0, 120, 80)).unwrap();
        surface.set_outline(shape.outline);
        surface
    }

    #[test]
    fn resize_drops_the_outline_and_region() {
        let mut surface = surface();
        assert!(surface.region().is_some());
        let outline = surface.outline().cloned().unwrap();
        assert!(!surface.set_outline(outline));

        assert!(!surface.resize(Size::new(120, 80)));
        assert!(surface.resize(Size::new(130, 80)));
        assert!(surface.outline().is_none());
        assert!(surface.region().is_none());
    }

    #[test]
    fn painted_region_is_the_window_region() {
        let surface = surface();
        let frame = surface.paint(&DefaultErrorMessages).unwrap();
        assert_eq!(Some(frame.region), surface.region());
    }

    #[test]
    fn paint_fills_body_and_strokes_border() {
        let frame = surface().paint(&DefaultErrorMessages).unwrap();
        // Inside the body.
        assert_eq!(frame.pixels.pixel(60, 50), Color::INFO);
        // On the left edge of the body.
        assert_eq!(frame.pixels.pixel(0, 50), Color::BLACK);
        // Above the body, away from the tip.
        assert_eq!(frame.pixels.pixel(100, 5).a, 0);
        assert!(!frame.region.contains(crate::geometry::Point::new(100, 5)));
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let mut surface = surface();
        surface.style_mut().back_style = BackStyle::VerticalGradient {
            top: Color::WHITE,
            bottom: Color::BLACK,
        };
        let frame = surface.paint(&DefaultErrorMessages).unwrap();
        let upper = frame.pixels.pixel(60, 25);
        let lower = frame.pixels.pixel(60, 75);
        assert!(upper.r > lower.r);
    }

    #[test]
    fn painting_without_outline_is_an_error() {
        let surface = ShapedSurface::new(Size::new(10, 10));
        assert!(matches!(
            surface.paint(&DefaultErrorMessages),
            Err(BalloonError::InvalidState { .. })
        ));
    }
}
