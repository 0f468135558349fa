use crate::geometry::{PointF, Rect};

const MAX_STEPS_PER_QUARTER: usize = 64;

/// Unit vector for an angle in degrees (y axis pointing down).
///
/// Quarter angles are returned exactly so rotated outlines stay bit-identical.
fn unit(angle_deg: f64) -> (f64, f64) {
    let normalized = angle_deg.rem_euclid(360.0);
    if normalized == 0.0 {
        (1.0, 0.0)
    } else if normalized == 90.0 {
        (0.0, 1.0)
    } else if normalized == 180.0 {
        (-1.0, 0.0)
    } else if normalized == 270.0 {
        (0.0, -1.0)
    } else {
        let rad = normalized.to_radians();
        (rad.cos(), rad.sin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        from: PointF,
        to: PointF,
    },
    Arc {
        center: PointF,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
    },
}

impl Segment {
    fn arc_point(center: PointF, radius: f64, angle_deg: f64) -> PointF {
        let (cos, sin) = unit(angle_deg);
        PointF::new(center.x + radius * cos, center.y + radius * sin)
    }

    pub fn start(&self) -> PointF {
        match *self {
            Segment::Line { from, .. } => from,
            Segment::Arc {
                center,
                radius,
                start_deg,
                ..
            } => Self::arc_point(center, radius, start_deg),
        }
    }

    pub fn end(&self) -> PointF {
        match *self {
            Segment::Line { to, .. } => to,
            Segment::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
            } => Self::arc_point(center, radius, start_deg + sweep_deg),
        }
    }

    fn transform(&self, t: &Transform) -> Segment {
        match *self {
            Segment::Line { from, to } => Segment::Line {
                from: t.apply(from),
                to: t.apply(to),
            },
            Segment::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
            } => Segment::Arc {
                center: t.apply(center),
                radius,
                start_deg: start_deg + t.rotation_deg(),
                sweep_deg,
            },
        }
    }

    /// Appends the points after `start()` up to and including `end()`.
    fn flatten_into(&self, out: &mut Vec<PointF>) {
        match *self {
            Segment::Line { to, .. } => out.push(to),
            Segment::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
            } => {
                let quarters = (sweep_deg.abs() / 90.0).max(0.25);
                let per_quarter = (radius.abs().ceil() as usize).clamp(4, MAX_STEPS_PER_QUARTER);
                let steps = ((quarters * per_quarter as f64).ceil() as usize).max(1);
                for i in 1..=steps {
                    let angle = start_deg + sweep_deg * (i as f64 / steps as f64);
                    out.push(Self::arc_point(center, radius, angle));
                }
            }
        }
    }
}

/// Rotation by a whole number of quarter turns followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    quarter_turns: i32,
    dx: f64,
    dy: f64,
}

impl Transform {
    /// `turns` quarter turns clockwise on screen (positive y down), then `(dx, dy)`.
    pub fn quarter_turns(turns: i32, dx: f64, dy: f64) -> Self {
        Self {
            quarter_turns: turns.rem_euclid(4),
            dx,
            dy,
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::quarter_turns(0, dx, dy)
    }

    pub fn rotation_deg(&self) -> f64 {
        self.quarter_turns as f64 * 90.0
    }

    pub fn apply(&self, p: PointF) -> PointF {
        let (x, y) = match self.quarter_turns {
            0 => (p.x, p.y),
            1 => (-p.y, p.x),
            2 => (-p.x, -p.y),
            _ => (p.y, -p.x),
        };
        PointF::new(x + self.dx, y + self.dy)
    }
}

/// A single closed figure made of arcs and straight lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    segments: Vec<Segment>,
}

impl Outline {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.start() == last.end(),
            _ => false,
        }
    }

    pub fn transform(&self, t: &Transform) -> Outline {
        Outline {
            segments: self.segments.iter().map(|s| s.transform(t)).collect(),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Outline {
        self.transform(&Transform::translation(dx, dy))
    }

    /// Flattened vertex ring. The closing vertex is not repeated.
    pub fn polygon(&self) -> Vec<PointF> {
        let Some(first) = self.segments.first() else {
            return Vec::new();
        };
        let mut points = vec![first.start()];
        for segment in &self.segments {
            segment.flatten_into(&mut points);
        }
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points.dedup();
        points
    }

    /// Smallest integer rectangle covering every vertex.
    pub fn bounds(&self) -> Rect {
        let polygon = self.polygon();
        if polygon.is_empty() {
            return Rect::default();
        }
        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for p in &polygon {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::from_ltrb(
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.ceil() as i32 + 1,
            max_y.ceil() as i32 + 1,
        )
    }

    /// Even-odd containment test against the flattened figure.
    pub fn contains(&self, p: PointF) -> bool {
        polygon_contains(&self.polygon(), p)
    }

    /// True when no two non-adjacent edges of the flattened figure touch.
    pub fn is_simple(&self) -> bool {
        let polygon = self.polygon();
        let n = polygon.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a = (polygon[i], polygon[(i + 1) % n]);
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                let b = (polygon[j], polygon[(j + 1) % n]);
                if segments_touch(a.0, a.1, b.0, b.1) {
                    return false;
                }
            }
        }
        true
    }
}

pub(crate) fn polygon_contains(polygon: &[PointF], p: PointF) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Squared distance from `p` to the segment `a`-`b`.
pub(crate) fn segment_distance_sq(p: PointF, a: PointF, b: PointF) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f64::EPSILON {
        return p.distance_sq(a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq).clamp(0.0, 1.0);
    p.distance_sq(PointF::new(a.x + t * vx, a.y + t * vy))
}

fn cross(o: PointF, a: PointF, b: PointF) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: PointF, a: PointF, b: PointF) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_touch(p1: PointF, p2: PointF, q1: PointF, q2: PointF) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(p1, q1, q2))
        || (d2 == 0.0 && on_segment(p2, q1, q2))
        || (d3 == 0.0 && on_segment(q1, p1, p2))
        || (d4 == 0.0 && on_segment(q2, p1, p2))
}

/// Accumulates segments, joining each new segment to the previous end point
/// with a straight line when they do not already meet.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    segments: Vec<Segment>,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, segment: Segment) {
        if let Some(last) = self.segments.last() {
            let from = last.end();
            let to = segment.start();
            if from != to {
                self.segments.push(Segment::Line { from, to });
            }
        }
        self.segments.push(segment);
    }

    pub fn arc(&mut self, center: PointF, radius: f64, start_deg: f64, sweep_deg: f64) -> &mut Self {
        self.push(Segment::Arc {
            center,
            radius,
            start_deg,
            sweep_deg,
        });
        self
    }

    /// Zero-length lines are dropped.
    pub fn line(&mut self, from: PointF, to: PointF) -> &mut Self {
        if from == to {
            if let Some(last) = self.segments.last() {
                if last.end() == from {
                    return self;
                }
            }
        }
        self.push(Segment::Line { from, to });
        self
    }

    pub fn close(&mut self) -> Outline {
        let mut segments = std::mem::take(&mut self.segments);
        if let (Some(first), Some(last)) = (segments.first(), segments.last()) {
            let (from, to) = (last.end(), first.start());
            if from != to {
                segments.push(Segment::Line { from, to });
            }
        }
        Outline { segments }
    }
}
