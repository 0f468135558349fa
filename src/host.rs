//! The windowing system as seen by a balloon.
//!
//! Everything runs on the UI thread: the host delivers element notifications,
//! timer expiry and window input through [`Host::poll_events`], and the
//! balloon reacts in [`crate::balloon::BalloonWindow::dispatch`].

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::region::Region;
use crate::render::{Bitmap, Color, RgbaBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Any on-screen element a balloon can anchor to (a control or a top-level window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Shaped, opaque popup that paints through [`Host::present_frame`].
    Balloon,
    /// Click-through per-pixel-alpha window fed by [`Host::update_layered`].
    Shadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    /// Client area in screen coordinates.
    pub screen_bounds: Rect,
    /// The element's own visibility flag; ancestors are checked separately.
    pub visible: bool,
    pub parent: Option<ElementId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementChange {
    Moved,
    Resized,
    VisibilityChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementEvent {
    pub subscription: SubscriptionId,
    pub element: ElementId,
    pub change: ElementChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Element(ElementEvent),
    Timer(TimerId),
    CloseRequested(WindowId),
    /// Left click inside a window, in window-local coordinates.
    Click { window: WindowId, point: Point },
}

/// Text the host draws over a presented frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bounds: Rect,
    pub color: Color,
    pub bold: bool,
}

pub trait Host {
    fn create_window(&mut self, kind: WindowKind) -> Result<WindowId>;
    fn destroy_window(&mut self, window: WindowId);
    fn set_window_bounds(&mut self, window: WindowId, bounds: Rect) -> Result<()>;
    fn set_window_visible(&mut self, window: WindowId, visible: bool) -> Result<()>;
    /// Keeps `window` above the top-level window that contains `owner`.
    fn set_window_owner(&mut self, window: WindowId, owner: Option<ElementId>) -> Result<()>;
    /// Clips hit testing and drawing to `region` (window-local).
    fn set_window_region(&mut self, window: WindowId, region: &Region) -> Result<()>;
    fn present_frame(&mut self, window: WindowId, frame: &RgbaBuffer, text: &[TextRun]) -> Result<()>;
    /// Per-pixel-alpha composition. `bitmap` must be premultiplied 32bpp.
    fn update_layered(
        &mut self,
        window: WindowId,
        location: Point,
        bitmap: &Bitmap,
        opacity: u8,
    ) -> Result<()>;

    /// Bounds of the monitor containing (or nearest to) `area`.
    fn monitor_bounds(&self, area: Rect) -> Rect;
    fn element(&self, element: ElementId) -> Option<ElementInfo>;
    /// Move, resize and visibility notifications for one element.
    fn subscribe(&mut self, element: ElementId) -> Result<SubscriptionId>;
    fn unsubscribe(&mut self, subscription: SubscriptionId);

    /// One-shot timer; expiry arrives as [`HostEvent::Timer`] on the UI thread.
    fn arm_timer(&mut self, window: WindowId, after: Duration) -> Result<TimerId>;
    fn cancel_timer(&mut self, timer: TimerId);

    fn poll_events(&mut self) -> Vec<HostEvent>;
}

/// Monitor containing a single point.
pub fn monitor_for_point(host: &dyn Host, point: Point) -> Rect {
    host.monitor_bounds(Rect::new(point.x, point.y, 1, 1))
}
