use balloon_window::geometry::Rect;
use balloon_window::layout::{body_bounds, compute_outline, LayoutState, Quadrant};
use balloon_window::region::Region;
use proptest::prelude::*;

fn quadrant_strategy() -> impl Strategy<Value = Quadrant> {
    prop_oneof![
        Just(Quadrant::Top),
        Just(Quadrant::Bottom),
        Just(Quadrant::Left),
        Just(Quadrant::Right),
    ]
}

/// Bounds, corner radius, margin and an offset that keeps the tip base on the
/// straight part of the anchor edge.
fn layout_strategy() -> impl Strategy<Value = (LayoutState, Rect)> {
    (
        quadrant_strategy(),
        -500i32..500,
        -500i32..500,
        100i32..400,
        100i32..400,
        1i32..12,
        1i32..30,
    )
        .prop_flat_map(|(quadrant, x, y, w, h, r, m)| {
            let along = if quadrant.is_horizontal() { w } else { h };
            let edge = along - 1 - r * 2;
            (0..=edge).prop_map(move |offset| {
                (
                    LayoutState {
                        quadrant,
                        offset,
                        corner_radius: r,
                        anchor_margin: m,
                    },
                    Rect::new(x, y, w, h),
                )
            })
        })
}

proptest! {
    #[test]
    fn outline_is_a_closed_simple_figure((state, bounds) in layout_strategy()) {
        let shape = compute_outline(&state, bounds).unwrap();
        prop_assert!(shape.outline.is_closed());
        prop_assert!(shape.outline.is_simple());
        prop_assert_eq!(shape.quadrant, state.quadrant);
        prop_assert_eq!(shape.body, body_bounds(state.quadrant, state.anchor_margin, bounds));
    }

    #[test]
    fn tip_sits_on_the_anchor_edge((state, bounds) in layout_strategy()) {
        let tip = compute_outline(&state, bounds).unwrap().anchor_tip;
        let along = state.corner_radius + state.offset;
        match state.quadrant {
            Quadrant::Top => {
                prop_assert_eq!(tip.y, bounds.y);
                prop_assert_eq!(tip.x - bounds.x, along);
            }
            Quadrant::Bottom => {
                prop_assert_eq!(tip.y, bounds.bottom() - 1);
                prop_assert_eq!(tip.x - bounds.x, along);
            }
            Quadrant::Left => {
                prop_assert_eq!(tip.x, bounds.x);
                prop_assert_eq!(tip.y - bounds.y, along);
            }
            Quadrant::Right => {
                prop_assert_eq!(tip.x, bounds.right() - 1);
                prop_assert_eq!(tip.y - bounds.y, along);
            }
        }
    }

    #[test]
    fn outline_stays_inside_its_bounds((state, bounds) in layout_strategy()) {
        let shape = compute_outline(&state, bounds).unwrap();
        let (left, top) = (bounds.x as f64, bounds.y as f64);
        let (right, bottom) = ((bounds.right() - 1) as f64, (bounds.bottom() - 1) as f64);
        for p in shape.outline.polygon() {
            prop_assert!(p.x >= left - 1e-6 && p.x <= right + 1e-6, "{p:?}");
            prop_assert!(p.y >= top - 1e-6 && p.y <= bottom + 1e-6, "{p:?}");
        }
        let region = Region::fill(&shape.outline);
        prop_assert!(!region.is_empty());
        prop_assert!(bounds.contains_rect(region.bounds()));
    }

    #[test]
    fn layout_is_deterministic((state, bounds) in layout_strategy()) {
        let first = compute_outline(&state, bounds).unwrap();
        let second = compute_outline(&state, bounds).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn translated_bounds_translate_the_outline(
        (state, bounds) in layout_strategy(),
        dx in -300i32..300,
        dy in -300i32..300,
    ) {
        let base = compute_outline(&state, bounds).unwrap();
        let moved = compute_outline(&state, bounds.offset(dx, dy)).unwrap();
        prop_assert_eq!(moved.anchor_tip, base.anchor_tip.offset(dx, dy));
        prop_assert_eq!(moved.body, base.body.offset(dx, dy));
        let center = base.body.pixel_center();
        prop_assert!(base.outline.contains(center.into()));
        prop_assert!(moved.outline.contains(center.offset(dx, dy).into()));
    }
}
