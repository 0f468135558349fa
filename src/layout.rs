//! Balloon outline geometry.
//!
//! Every quadrant is built as a Top-quadrant outline in an unrotated local
//! frame and then mapped into place with a quarter-turn transform. Left and
//! Right swap width and height before building, so corner and tip
//! construction is shared by all four sides.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, PointF, Rect};
use crate::outline::{Outline, OutlineBuilder, Transform};

pub const DEFAULT_CORNER_RADIUS: i32 = 7;
pub const DEFAULT_ANCHOR_MARGIN: i32 = 20;
pub const DEFAULT_ANCHOR_OFFSET: i32 = 10;

/// The balloon edge that carries the anchor tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Top,
    Bottom,
    Left,
    Right,
}

impl Quadrant {
    /// Top and Bottom put the tip on a horizontal edge.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Quadrant::Top | Quadrant::Bottom)
    }

    pub fn opposite(self) -> Quadrant {
        match self {
            Quadrant::Top => Quadrant::Bottom,
            Quadrant::Bottom => Quadrant::Top,
            Quadrant::Left => Quadrant::Right,
            Quadrant::Right => Quadrant::Left,
        }
    }
}

/// Requested quadrant. `Auto` lets placement pick the side at show time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorQuadrant {
    Top,
    Bottom,
    Left,
    Right,
    Auto,
}

impl AnchorQuadrant {
    pub fn concrete(self) -> Option<Quadrant> {
        match self {
            AnchorQuadrant::Top => Some(Quadrant::Top),
            AnchorQuadrant::Bottom => Some(Quadrant::Bottom),
            AnchorQuadrant::Left => Some(Quadrant::Left),
            AnchorQuadrant::Right => Some(Quadrant::Right),
            AnchorQuadrant::Auto => None,
        }
    }
}

impl From<Quadrant> for AnchorQuadrant {
    fn from(q: Quadrant) -> Self {
        match q {
            Quadrant::Top => AnchorQuadrant::Top,
            Quadrant::Bottom => AnchorQuadrant::Bottom,
            Quadrant::Left => AnchorQuadrant::Left,
            Quadrant::Right => AnchorQuadrant::Right,
        }
    }
}

/// Requested position of the tip along the anchor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorOffset {
    /// Keep the tip away from whichever corner is flush with a screen edge.
    Auto,
    /// Keep the tip in the middle of the edge.
    Centered,
    /// Pixels from the near corner's radius.
    Fixed(i32),
}

/// Concrete inputs to [`compute_outline`]. Offset sentinels are already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    pub quadrant: Quadrant,
    pub offset: i32,
    pub corner_radius: i32,
    pub anchor_margin: i32,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            quadrant: Quadrant::Top,
            offset: DEFAULT_ANCHOR_OFFSET,
            corner_radius: DEFAULT_CORNER_RADIUS,
            anchor_margin: DEFAULT_ANCHOR_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalloonShape {
    pub outline: Outline,
    /// Tip position in the same coordinate space as the input bounds.
    pub anchor_tip: Point,
    pub quadrant: Quadrant,
    /// Input bounds minus the margin strip reserved for the tip.
    pub body: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout bounds {0:?} have no area")]
    EmptyBounds(Rect),
    #[error("corner radius must be positive, got {0}")]
    CornerRadius(i32),
    #[error("anchor margin must not be negative, got {0}")]
    NegativeMargin(i32),
    #[error("anchor offset must not be negative, got {0}")]
    NegativeOffset(i32),
}

/// Length of the anchor edge in local (unrotated) coordinates.
pub fn edge_length(quadrant: Quadrant, bounds: Rect) -> i32 {
    if quadrant.is_horizontal() {
        bounds.width - 1
    } else {
        bounds.height - 1
    }
}

/// Offset that places the tip in the middle of the anchor edge.
pub fn centered_offset(quadrant: Quadrant, corner_radius: i32, bounds: Rect) -> i32 {
    (edge_length(quadrant, bounds) - corner_radius * 2) / 2
}

pub fn body_bounds(quadrant: Quadrant, anchor_margin: i32, bounds: Rect) -> Rect {
    let m = anchor_margin;
    match quadrant {
        Quadrant::Top => Rect::new(bounds.x, bounds.y + m, bounds.width, bounds.height - m),
        Quadrant::Bottom => Rect::new(bounds.x, bounds.y, bounds.width, bounds.height - m),
        Quadrant::Left => Rect::new(bounds.x + m, bounds.y, bounds.width - m, bounds.height),
        Quadrant::Right => Rect::new(bounds.x, bounds.y, bounds.width - m, bounds.height),
    }
}

/// Builds the balloon outline and locates its anchor tip.
///
/// The tip apex sits `corner_radius + offset` pixels from the top (Left/Right)
/// or left (Top/Bottom) end of the anchor edge. An offset that pushes the tip
/// base into a corner arc is drawn as requested; range checks belong to the
/// caller.
///
/// The middle of the edge is `edge / 2` and a mirrored side uses
/// `edge - offset`, both without a rounding bias. A centered tip is therefore
/// symmetric rather than leaning one pixel left, and Bottom or Left is exactly
/// Top or Right turned through 180 degrees.
pub fn compute_outline(state: &LayoutState, bounds: Rect) -> Result<BalloonShape, LayoutError> {
    if bounds.is_empty() {
        return Err(LayoutError::EmptyBounds(bounds));
    }
    if state.corner_radius <= 0 {
        return Err(LayoutError::CornerRadius(state.corner_radius));
    }
    if state.anchor_margin < 0 {
        return Err(LayoutError::NegativeMargin(state.anchor_margin));
    }
    if state.offset < 0 {
        return Err(LayoutError::NegativeOffset(state.offset));
    }

    let quadrant = state.quadrant;
    let w = bounds.width - 1;
    let h = bounds.height - 1;
    let (local_w, local_h) = if quadrant.is_horizontal() { (w, h) } else { (h, w) };
    let r = state.corner_radius;
    let m = state.anchor_margin;
    let edge = local_w - r * 2;
    let center = edge / 2;

    // Bottom and Left run their anchor edge backwards once rotated, so the
    // offset and the tip's lean are mirrored in the local frame.
    let (turns, dx, dy, flipped) = match quadrant {
        Quadrant::Top => (0, 0, 0, false),
        Quadrant::Bottom => (2, w, h, true),
        Quadrant::Left => (3, 0, h, true),
        Quadrant::Right => (1, w, 0, false),
    };
    let (offset, lean) = if flipped {
        (edge - state.offset, state.offset.cmp(&center).reverse())
    } else {
        (state.offset, state.offset.cmp(&center))
    };

    let tip_x = offset + r;
    let apex = pt(tip_x, 0);
    let (base_start, base_end) = match lean {
        Ordering::Less => (pt(tip_x, m), pt(tip_x + m, m)),
        Ordering::Greater => (pt(tip_x - m, m), pt(tip_x, m)),
        Ordering::Equal => (pt(tip_x - m, m), pt(tip_x + m, m)),
    };

    let radius = r as f64;
    let mut builder = OutlineBuilder::new();
    builder
        .arc(pt(r, m + r), radius, 180.0, 90.0)
        .line(base_start, apex)
        .line(apex, base_end)
        .arc(pt(local_w - r, m + r), radius, 270.0, 90.0)
        .arc(pt(local_w - r, local_h - r), radius, 0.0, 90.0)
        .arc(pt(r, local_h - r), radius, 90.0, 90.0);
    let local = builder.close();

    let transform = Transform::quarter_turns(
        turns,
        (dx + bounds.x) as f64,
        (dy + bounds.y) as f64,
    );
    Ok(BalloonShape {
        outline: local.transform(&transform),
        anchor_tip: transform.apply(apex).round(),
        quadrant,
        body: body_bounds(quadrant, m, bounds),
    })
}

fn pt(x: i32, y: i32) -> PointF {
    PointF::new(x as f64, y as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(quadrant: Quadrant, offset: i32) -> LayoutState {
        LayoutState {
            quadrant,
            offset,
            ..LayoutState::default()
        }
    }

    #[test]
    fn top_tip_sits_radius_plus_offset_along_top_edge() {
        let shape = compute_outline(&state(Quadrant::Top, 10), Rect::new(0, 0, 200, 120)).unwrap();
        assert_eq!(shape.anchor_tip, Point::new(17, 0));
        assert_eq!(shape.body, Rect::new(0, 20, 200, 100));
        assert!(shape.outline.is_closed());
        assert!(shape.outline.is_simple());
    }

    #[test]
    fn every_quadrant_measures_offset_from_the_same_end() {
        let bounds = Rect::new(0, 0, 200, 140);
        let tip = |q| compute_outline(&state(q, 30), bounds).unwrap().anchor_tip;
        assert_eq!(tip(Quadrant::Top), Point::new(37, 0));
        assert_eq!(tip(Quadrant::Bottom), Point::new(37, 139));
        assert_eq!(tip(Quadrant::Left), Point::new(0, 37));
        assert_eq!(tip(Quadrant::Right), Point::new(199, 37));
    }

    #[test]
    fn bottom_is_top_rotated_half_a_turn() {
        let bounds = Rect::new(0, 0, 200, 120);
        let edge = edge_length(Quadrant::Top, bounds) - 2 * DEFAULT_CORNER_RADIUS;
        let top = compute_outline(&state(Quadrant::Top, edge - 25), bounds).unwrap();
        let bottom = compute_outline(&state(Quadrant::Bottom, 25), bounds).unwrap();
        let half_turn = Transform::quarter_turns(2, 199.0, 119.0);
        assert_eq!(top.outline.transform(&half_turn), bottom.outline);
    }

    #[test]
    fn bounds_origin_is_carried_into_the_result() {
        let shape = compute_outline(&state(Quadrant::Right, 10), Rect::new(100, 50, 160, 90)).unwrap();
        assert_eq!(shape.anchor_tip, Point::new(259, 67));
        assert_eq!(shape.body, Rect::new(100, 50, 140, 90));
    }

    #[test]
    fn centered_offset_produces_a_symmetric_tip() {
        let bounds = Rect::new(0, 0, 201, 120);
        let offset = centered_offset(Quadrant::Top, DEFAULT_CORNER_RADIUS, bounds);
        assert_eq!(offset, 93);
        let shape = compute_outline(&state(Quadrant::Top, offset), bounds).unwrap();
        let poly = shape.outline.polygon();
        assert!(poly.contains(&PointF::new(80.0, 20.0)));
        assert!(poly.contains(&PointF::new(120.0, 20.0)));
        assert_eq!(shape.anchor_tip, Point::new(100, 0));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let bounds = Rect::new(0, 0, 100, 100);
        assert_eq!(
            compute_outline(&LayoutState::default(), Rect::default()),
            Err(LayoutError::EmptyBounds(Rect::default()))
        );
        let mut s = LayoutState::default();
        s.corner_radius = 0;
        assert_eq!(compute_outline(&s, bounds), Err(LayoutError::CornerRadius(0)));
        let mut s = LayoutState::default();
        s.anchor_margin = -1;
        assert_eq!(compute_outline(&s, bounds), Err(LayoutError::NegativeMargin(-1)));
        let mut s = LayoutState::default();
        s.offset = -2;
        assert_eq!(compute_outline(&s, bounds), Err(LayoutError::NegativeOffset(-2)));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let s = state(Quadrant::Left, 12);
        let bounds = Rect::new(3, 4, 180, 130);
        assert_eq!(compute_outline(&s, bounds), compute_outline(&s, bounds));
    }
}
