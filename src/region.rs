//! Conversion of vector outlines into pixel regions.
//!
//! A region is a list of one-pixel-high spans sorted by row and column. It is
//! the form the host needs to clip a window to a non-rectangular shape, and
//! the form the rasteriser uses to decide which pixels a fill or stroke
//! touches. Pixel `(x, y)` is sampled at its center `(x + 0.5, y + 0.5)`.

use std::collections::BTreeMap;

use crate::geometry::{Point, PointF, Rect};
use crate::outline::{segment_distance_sq, Outline};

/// Half-width of the pen used to widen an outline before it becomes a window region.
const WIDEN_HALF_WIDTH: f64 = 0.5;
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    spans: Vec<Rect>,
}

impl Region {
    pub fn from_rect(rect: Rect) -> Region {
        if rect.is_empty() {
            return Region::default();
        }
        Region {
            spans: (rect.y..rect.bottom())
                .map(|y| Rect::new(rect.x, y, rect.width, 1))
                .collect(),
        }
    }

    /// Window region for an outline: the interior unioned with a one pixel
    /// wide stroke along the edge, so anti-aliased borders are not clipped.
    pub fn from_outline(outline: &Outline) -> Region {
        Region::fill(outline).union(&Region::stroke(outline, WIDEN_HALF_WIDTH * 2.0))
    }

    /// Pixels whose centers lie inside the outline.
    pub fn fill(outline: &Outline) -> Region {
        let polygon = outline.polygon();
        let bounds = outline.bounds();
        if polygon.len() < 3 || bounds.is_empty() {
            return Region::default();
        }
        let mut spans = Vec::new();
        for y in bounds.y..bounds.bottom() {
            let yc = y as f64 + 0.5;
            let mut crossings = row_crossings(&polygon, yc);
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                // First and last pixel whose centers fall inside [pair[0], pair[1]).
                let x0 = (pair[0] - 0.5).ceil() as i32;
                let x1 = (pair[1] - 0.5 - EPS).ceil() as i32;
                if x1 > x0 {
                    spans.push(Rect::new(x0, y, x1 - x0, 1));
                }
            }
        }
        Region::normalized(spans)
    }

    /// Pixels whose centers lie within `width / 2` of the outline edge.
    pub fn stroke(outline: &Outline, width: f64) -> Region {
        let polygon = outline.polygon();
        if polygon.len() < 2 || width <= 0.0 {
            return Region::default();
        }
        let half = width / 2.0;
        let limit = half * half + EPS;
        let pad = half.ceil() as i32 + 1;
        let bounds = outline.bounds();
        let grid = Rect::from_ltrb(
            bounds.x - pad,
            bounds.y - pad,
            bounds.right() + pad,
            bounds.bottom() + pad,
        );
        let mut mask = vec![false; (grid.width as usize) * (grid.height as usize)];
        let n = polygon.len();
        for i in 0..n {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            let left = (a.x.min(b.x) - half).floor() as i32 - 1;
            let right = (a.x.max(b.x) + half).ceil() as i32 + 1;
            let top = (a.y.min(b.y) - half).floor() as i32 - 1;
            let bottom = (a.y.max(b.y) + half).ceil() as i32 + 1;
            for y in top.max(grid.y)..bottom.min(grid.bottom()) {
                for x in left.max(grid.x)..right.min(grid.right()) {
                    let center = PointF::new(x as f64 + 0.5, y as f64 + 0.5);
                    if segment_distance_sq(center, a, b) <= limit {
                        let idx = ((y - grid.y) * grid.width + (x - grid.x)) as usize;
                        mask[idx] = true;
                    }
                }
            }
        }
        Region::from_mask(&mask, grid)
    }

    fn from_mask(mask: &[bool], grid: Rect) -> Region {
        let mut spans = Vec::new();
        for row in 0..grid.height {
            let base = (row * grid.width) as usize;
            let mut x = 0;
            while x < grid.width {
                if !mask[base + x as usize] {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < grid.width && mask[base + x as usize] {
                    x += 1;
                }
                spans.push(Rect::new(grid.x + start, grid.y + row, x - start, 1));
            }
        }
        Region { spans }
    }

    fn normalized(spans: Vec<Rect>) -> Region {
        let rows = Self::rows_of(&spans);
        Region::from_rows(rows)
    }

    fn rows_of(spans: &[Rect]) -> BTreeMap<i32, Vec<(i32, i32)>> {
        let mut rows: BTreeMap<i32, Vec<(i32, i32)>> = BTreeMap::new();
        for span in spans.iter().filter(|s| !s.is_empty()) {
            for y in span.y..span.bottom() {
                rows.entry(y).or_default().push((span.x, span.right()));
            }
        }
        for intervals in rows.values_mut() {
            intervals.sort_unstable();
            let mut merged: Vec<(i32, i32)> = Vec::with_capacity(intervals.len());
            for &(x0, x1) in intervals.iter() {
                match merged.last_mut() {
                    Some(last) if x0 <= last.1 => last.1 = last.1.max(x1),
                    _ => merged.push((x0, x1)),
                }
            }
            *intervals = merged;
        }
        rows
    }

    fn from_rows(rows: BTreeMap<i32, Vec<(i32, i32)>>) -> Region {
        let spans = rows
            .into_iter()
            .flat_map(|(y, intervals)| {
                intervals
                    .into_iter()
                    .map(move |(x0, x1)| Rect::new(x0, y, x1 - x0, 1))
            })
            .collect();
        Region { spans }
    }

    fn combine(&self, other: &Region, op: fn(bool, bool) -> bool) -> Region {
        let a = Self::rows_of(&self.spans);
        let b = Self::rows_of(&other.spans);
        let mut out: BTreeMap<i32, Vec<(i32, i32)>> = BTreeMap::new();
        let empty = Vec::new();
        let ys: std::collections::BTreeSet<i32> = a.keys().chain(b.keys()).copied().collect();
        for y in ys {
            let ra = a.get(&y).unwrap_or(&empty);
            let rb = b.get(&y).unwrap_or(&empty);
            let mut edges: Vec<i32> = ra
                .iter()
                .chain(rb.iter())
                .flat_map(|&(x0, x1)| [x0, x1])
                .collect();
            edges.sort_unstable();
            edges.dedup();
            let mut intervals: Vec<(i32, i32)> = Vec::new();
            for pair in edges.windows(2) {
                let x = pair[0];
                let inside_a = ra.iter().any(|&(x0, x1)| x >= x0 && x < x1);
                let inside_b = rb.iter().any(|&(x0, x1)| x >= x0 && x < x1);
                if !op(inside_a, inside_b) {
                    continue;
                }
                match intervals.last_mut() {
                    Some(last) if last.1 == pair[0] => last.1 = pair[1],
                    _ => intervals.push((pair[0], pair[1])),
                }
            }
            if !intervals.is_empty() {
                out.insert(y, intervals);
            }
        }
        Region::from_rows(out)
    }

    pub fn union(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a || b)
    }

    pub fn intersect(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a && b)
    }

    pub fn xor(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a != b)
    }

    pub fn clip(&self, rect: Rect) -> Region {
        self.intersect(&Region::from_rect(rect))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            spans: self.spans.iter().map(|s| s.offset(dx, dy)).collect(),
        }
    }

    pub fn spans(&self) -> &[Rect] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn bounds(&self) -> Rect {
        self.spans
            .iter()
            .fold(Rect::default(), |acc, span| acc.union(*span))
    }

    pub fn area(&self) -> i64 {
        self.spans.iter().map(|s| s.width as i64).sum()
    }

    pub fn contains(&self, p: Point) -> bool {
        let idx = self.spans.partition_point(|s| s.y < p.y);
        self.spans[idx..]
            .iter()
            .take_while(|s| s.y == p.y)
            .any(|s| p.x >= s.x && p.x < s.right())
    }
}

fn row_crossings(polygon: &[PointF], yc: f64) -> Vec<f64> {
    let n = polygon.len();
    let mut xs = Vec::new();
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > yc) != (b.y > yc) {
            xs.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
        }
        j = i;
    }
    xs
}

#[cfg(test)]
mod tests {
    use super::Region;
    use crate::geometry::{Point, PointF, Rect};
    use crate::outline::OutlineBuilder;

    fn rect_outline(w: f64, h: f64) -> crate::outline::Outline {
        let mut b = OutlineBuilder::new();
        b.line(PointF::new(0.0, 0.0), PointF::new(w, 0.0))
            .line(PointF::new(w, 0.0), PointF::new(w, h))
            .line(PointF::new(w, h), PointF::new(0.0, h));
        b.close()
    }

    #[test]
    fn fill_samples_pixel_centers() {
        let region = Region::fill(&rect_outline(4.0, 3.0));
        assert_eq!(region.area(), 12);
        assert_eq!(region.bounds(), Rect::new(0, 0, 4, 3));
    }

    #[test]
    fn widened_region_covers_the_far_edge_pixels() {
        // A window of width w draws its outline on 0..=w-1, so the widened region
        // must include column w-1 and row h-1.
        let region = Region::from_outline(&rect_outline(9.0, 4.0)).clip(Rect::new(0, 0, 10, 5));
        assert_eq!(region.bounds(), Rect::new(0, 0, 10, 5));
        // The far corner pixel center sits ~0.71px from the corner.
        assert_eq!(region.area(), 49);
        assert!(!region.contains(Point::new(9, 4)));
    }

    #[test]
    fn xor_keeps_only_non_overlapping_parts() {
        let a = Region::from_rect(Rect::new(0, 0, 10, 10));
        let b = a.translate(5, 5);
        let x = a.xor(&b);
        assert_eq!(x.area(), 100 + 100 - 2 * 25);
        assert!(x.contains(Point::new(0, 0)));
        assert!(!x.contains(Point::new(7, 7)));
        assert!(x.contains(Point::new(12, 12)));
    }

    #[test]
    fn union_merges_touching_spans() {
        let a = Region::from_rect(Rect::new(0, 0, 5, 1));
        let b = Region::from_rect(Rect::new(5, 0, 5, 1));
        assert_eq!(a.union(&b).spans(), &[Rect::new(0, 0, 10, 1)]);
    }
}
