//! Screen placement rules shared by the balloon state machine.
//!
//! These are pure functions over rectangles so that the flip, offset and
//! anchoring behavior can be exercised without a windowing host.

use crate::geometry::{Point, Rect, Size};
use crate::layout::{centered_offset, AnchorOffset, AnchorQuadrant, Quadrant};

/// Distance kept between the tip and a corner flush with a screen edge.
pub const EDGE_INSET: i32 = 10;
/// Extra clearance used when the anchor is pushed outside a target rectangle.
pub const OBSCURE_CLEARANCE: i32 = 4;

/// Effective quadrant for a window at `window` on `screen`.
///
/// Only flips to the opposite side are considered, and only when the window
/// touches or crosses the screen edge facing away from the tip.
pub fn resolve_quadrant(
    requested: AnchorQuadrant,
    current: Quadrant,
    window: Rect,
    screen: Rect,
) -> Quadrant {
    if let Some(fixed) = requested.concrete() {
        return fixed;
    }
    let mut quadrant = current;
    if quadrant == Quadrant::Left && window.right() >= screen.right() {
        quadrant = Quadrant::Right;
    }
    if quadrant == Quadrant::Right && window.left() <= screen.left() {
        quadrant = Quadrant::Left;
    }
    if quadrant == Quadrant::Top && window.bottom() >= screen.bottom() {
        quadrant = Quadrant::Bottom;
    }
    if quadrant == Quadrant::Bottom && window.top() <= screen.top() {
        quadrant = Quadrant::Top;
    }
    quadrant
}

/// Concrete tip offset for the requested offset mode.
pub fn resolve_offset(
    requested: AnchorOffset,
    current: i32,
    quadrant: Quadrant,
    corner_radius: i32,
    window: Rect,
    screen: Rect,
) -> i32 {
    match requested {
        AnchorOffset::Fixed(offset) => offset,
        AnchorOffset::Centered => centered_offset(quadrant, corner_radius, window).max(0),
        AnchorOffset::Auto => {
            let mut offset = current;
            if quadrant.is_horizontal() {
                if window.right() >= screen.right() {
                    offset = window.width - corner_radius * 2 - EDGE_INSET;
                }
                if window.left() <= screen.left() {
                    offset = EDGE_INSET;
                }
            } else {
                if window.top() <= screen.top() {
                    offset = EDGE_INSET;
                }
                if window.bottom() >= screen.bottom() {
                    offset = window.height - corner_radius * 2 - EDGE_INSET;
                }
            }
            offset.max(0)
        }
    }
}

/// Anchor and pivot points for a rectangle target.
///
/// The rectangle is first clipped to `screen`; `None` means nothing of it is
/// on screen. With `allow_obscure` off the anchor is pushed out of the
/// rectangle on the side facing the balloon while the pivot stays centered.
pub fn anchor_for_rect(
    rect: Rect,
    screen: Rect,
    quadrant: Quadrant,
    allow_obscure: bool,
) -> Option<(Point, Point)> {
    let visible = rect.intersect(screen);
    if visible.is_empty() {
        return None;
    }
    let center = visible.pixel_center();
    let pivot = center;
    if allow_obscure {
        return Some((center, pivot));
    }
    let push_x = (center.x - visible.left() + OBSCURE_CLEARANCE).abs();
    let push_y = (center.y - visible.top() + OBSCURE_CLEARANCE).abs();
    let anchor = match quadrant {
        Quadrant::Top => center.offset(0, push_y + 1),
        Quadrant::Bottom => center.offset(0, -push_y),
        Quadrant::Left => center.offset(push_x + 1, 0),
        Quadrant::Right => center.offset(-push_x, 0),
    };
    Some((anchor, pivot))
}

/// Part of an element that is actually visible: its bounds clipped by each
/// ancestor's client area in turn, then by the monitor.
pub fn visible_target_bounds(element: Rect, ancestors: &[Rect], screen: Rect) -> Rect {
    let mut visible = element;
    for ancestor in ancestors {
        if visible.is_empty() {
            break;
        }
        visible = visible.intersect(*ancestor);
    }
    screen.intersect(visible)
}

/// Window displacement that brings a moved tip back onto `point`.
///
/// On every axis where the tip moved, the displacement also mirrors the
/// window across the pivot so the balloon stays next to the target it was
/// flipped away from.
pub fn flip_correction(point: Point, pivot: Point, tip: Point) -> (i32, i32) {
    let mut dx = point.x - tip.x;
    let mut dy = point.y - tip.y;
    if point.x != tip.x {
        dx += (pivot.x - point.x) * 2;
    }
    if point.y != tip.y {
        dy += (pivot.y - point.y) * 2;
    }
    (dx, dy)
}

/// Window size after the tip moves from `from` to `to`.
///
/// The margin strip is given back on the old axis and taken on the new one so
/// the balloon body keeps its size.
pub fn reallocate_margin(
    size: Size,
    from: Quadrant,
    from_margin: i32,
    to: Quadrant,
    to_margin: i32,
) -> Size {
    let mut size = size;
    if from.is_horizontal() {
        size.height -= from_margin;
    } else {
        size.width -= from_margin;
    }
    if to.is_horizontal() {
        size.height += to_margin;
    } else {
        size.width += to_margin;
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn fixed_quadrants_are_never_flipped() {
        let offscreen = Rect::new(1800, 1000, 200, 120);
        assert_eq!(
            resolve_quadrant(AnchorQuadrant::Left, Quadrant::Left, offscreen, SCREEN),
            Quadrant::Left
        );
    }

    #[test]
    fn auto_flips_only_toward_the_opposite_side() {
        let past_right = Rect::new(1800, 400, 200, 120);
        assert_eq!(
            resolve_quadrant(AnchorQuadrant::Auto, Quadrant::Left, past_right, SCREEN),
            Quadrant::Right
        );
        let past_bottom = Rect::new(400, 1000, 200, 120);
        assert_eq!(
            resolve_quadrant(AnchorQuadrant::Auto, Quadrant::Top, past_bottom, SCREEN),
            Quadrant::Bottom
        );
        // Top does not flip for horizontal overflow.
        assert_eq!(
            resolve_quadrant(AnchorQuadrant::Auto, Quadrant::Top, past_right, SCREEN),
            Quadrant::Top
        );
    }

    #[test]
    fn auto_offset_moves_tip_away_from_flush_corner() {
        let past_right = Rect::new(1883, 50, 200, 120);
        assert_eq!(
            resolve_offset(AnchorOffset::Auto, 10, Quadrant::Top, 7, past_right, SCREEN),
            176
        );
        let flush_left = Rect::new(0, 50, 200, 120);
        assert_eq!(
            resolve_offset(AnchorOffset::Auto, 40, Quadrant::Top, 7, flush_left, SCREEN),
            EDGE_INSET
        );
        let inside = Rect::new(100, 100, 200, 120);
        assert_eq!(
            resolve_offset(AnchorOffset::Auto, 40, Quadrant::Top, 7, inside, SCREEN),
            40
        );
    }

    #[test]
    fn centered_offset_uses_the_anchor_edge() {
        let window = Rect::new(0, 0, 201, 141);
        assert_eq!(
            resolve_offset(AnchorOffset::Centered, 0, Quadrant::Left, 7, window, SCREEN),
            63
        );
        assert_eq!(
            resolve_offset(AnchorOffset::Fixed(5), 0, Quadrant::Left, 7, window, SCREEN),
            5
        );
    }

    #[test]
    fn non_obscuring_anchor_clears_the_rectangle() {
        let target = Rect::new(100, 100, 41, 21);
        let (anchor, pivot) = anchor_for_rect(target, SCREEN, Quadrant::Top, false).unwrap();
        assert_eq!(pivot, Point::new(120, 110));
        assert_eq!(anchor, Point::new(120, 110 + 14 + 1));
        assert!(!target.contains_point(anchor));

        let (anchor, _) = anchor_for_rect(target, SCREEN, Quadrant::Right, false).unwrap();
        assert_eq!(anchor, Point::new(120 - 24, 110));
        assert!(!target.contains_point(anchor));
    }

    #[test]
    fn offscreen_rectangle_has_no_anchor() {
        let target = Rect::new(-500, -500, 100, 100);
        assert_eq!(anchor_for_rect(target, SCREEN, Quadrant::Top, true), None);
    }

    #[test]
    fn visible_bounds_walk_every_ancestor() {
        let element = Rect::new(50, 50, 100, 100);
        let ancestors = [Rect::new(0, 0, 120, 400), Rect::new(60, 0, 500, 500)];
        assert_eq!(
            visible_target_bounds(element, &ancestors, SCREEN),
            Rect::new(60, 50, 60, 100)
        );
        let hidden = [Rect::new(500, 500, 10, 10)];
        assert!(visible_target_bounds(element, &hidden, SCREEN).is_empty());
    }

    #[test]
    fn flip_correction_mirrors_across_the_pivot() {
        assert_eq!(
            flip_correction(Point::new(100, 50), Point::new(100, 50), Point::new(120, 50)),
            (-20, 0)
        );
        assert_eq!(
            flip_correction(Point::new(100, 60), Point::new(100, 40), Point::new(100, 80)),
            (0, -20 - 40)
        );
    }

    #[test]
    fn margin_moves_between_axes() {
        let size = reallocate_margin(Size::new(200, 120), Quadrant::Top, 20, Quadrant::Left, 20);
        assert_eq!(size, Size::new(220, 100));
        let same = reallocate_margin(Size::new(200, 120), Quadrant::Top, 20, Quadrant::Bottom, 20);
        assert_eq!(same, Size::new(200, 120));
    }
}
