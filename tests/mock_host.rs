#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use balloon_window::error::Result;
use balloon_window::geometry::{Point, Rect};
use balloon_window::host::{
    ElementChange, ElementEvent, ElementId, ElementInfo, Host, HostEvent, SubscriptionId,
    TextRun, TimerId, WindowId, WindowKind,
};
use balloon_window::region::Region;
use balloon_window::render::{Bitmap, PixelFormat, RgbaBuffer};

pub const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

#[derive(Debug, Clone)]
pub struct MockWindow {
    pub kind: WindowKind,
    pub bounds: Rect,
    pub visible: bool,
    pub owner: Option<ElementId>,
    pub region: Option<Region>,
    pub frames: usize,
    pub last_text: Vec<TextRun>,
    /// (location, opacity, format) of each layered update.
    pub layered: Vec<(Point, u8, PixelFormat)>,
}

/// In-memory windowing system with a manual clock.
#[derive(Debug)]
pub struct MockHost {
    pub monitors: Vec<Rect>,
    pub windows: BTreeMap<WindowId, MockWindow>,
    pub destroyed: Vec<WindowId>,
    pub elements: BTreeMap<ElementId, ElementInfo>,
    pub subscriptions: BTreeMap<SubscriptionId, ElementId>,
    pub timers: BTreeMap<TimerId, u64>,
    pub now_ms: u64,
    queue: VecDeque<HostEvent>,
    next_id: u64,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::with_monitors(vec![SCREEN])
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitors(monitors: Vec<Rect>) -> Self {
        Self {
            monitors,
            windows: BTreeMap::new(),
            destroyed: Vec::new(),
            elements: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            timers: BTreeMap::new(),
            now_ms: 0,
            queue: VecDeque::new(),
            next_id: 0,
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_element(&mut self, bounds: Rect, parent: Option<ElementId>) -> ElementId {
        let id = ElementId(self.next());
        self.elements.insert(
            id,
            ElementInfo {
                screen_bounds: bounds,
                visible: true,
                parent,
            },
        );
        id
    }

    fn is_descendant(&self, element: ElementId, ancestor: ElementId) -> bool {
        let mut next = Some(element);
        while let Some(id) = next {
            if id == ancestor {
                return true;
            }
            next = self.elements.get(&id).and_then(|info| info.parent);
        }
        false
    }

    fn notify(&mut self, element: ElementId, change: ElementChange) {
        let subscribed: Vec<SubscriptionId> = self
            .subscriptions
            .iter()
            .filter(|(_, watched)| **watched == element)
            .map(|(id, _)| *id)
            .collect();
        for subscription in subscribed {
            self.queue.push_back(HostEvent::Element(ElementEvent {
                subscription,
                element,
                change,
            }));
        }
    }

    /// Moves `element` and everything inside it.
    pub fn move_element(&mut self, element: ElementId, dx: i32, dy: i32) {
        let moved: Vec<ElementId> = self
            .elements
            .keys()
            .copied()
            .filter(|id| self.is_descendant(*id, element))
            .collect();
        for id in moved {
            if let Some(info) = self.elements.get_mut(&id) {
                info.screen_bounds = info.screen_bounds.offset(dx, dy);
            }
            self.notify(id, ElementChange::Moved);
        }
    }

    pub fn resize_element(&mut self, element: ElementId, width: i32, height: i32) {
        if let Some(info) = self.elements.get_mut(&element) {
            info.screen_bounds.width = width;
            info.screen_bounds.height = height;
        }
        self.notify(element, ElementChange::Resized);
    }

    pub fn set_element_visible(&mut self, element: ElementId, visible: bool) {
        if let Some(info) = self.elements.get_mut(&element) {
            info.visible = visible;
        }
        self.notify(element, ElementChange::VisibilityChanged(visible));
    }

    /// Advances the clock and queues every timer that expired.
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        let expired: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= self.now_ms)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.timers.remove(&id);
            self.queue.push_back(HostEvent::Timer(id));
        }
    }

    pub fn click(&mut self, window: WindowId, point: Point) {
        self.queue.push_back(HostEvent::Click { window, point });
    }

    pub fn request_close(&mut self, window: WindowId) {
        self.queue.push_back(HostEvent::CloseRequested(window));
    }

    pub fn window(&self, id: WindowId) -> &MockWindow {
        self.windows.get(&id).expect("window exists")
    }

    pub fn windows_of(&self, kind: WindowKind) -> Vec<&MockWindow> {
        self.windows.values().filter(|w| w.kind == kind).collect()
    }

    pub fn shadow(&self) -> Option<&MockWindow> {
        self.windows_of(WindowKind::Shadow).into_iter().next()
    }
}

impl Host for MockHost {
    fn create_window(&mut self, kind: WindowKind) -> Result<WindowId> {
        let id = WindowId(self.next());
        self.windows.insert(
            id,
            MockWindow {
                kind,
                bounds: Rect::default(),
                visible: false,
                owner: None,
                region: None,
                frames: 0,
                last_text: Vec::new(),
                layered: Vec::new(),
            },
        );
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        if self.windows.remove(&window).is_some() {
            self.destroyed.push(window);
        }
    }

    fn set_window_bounds(&mut self, window: WindowId, bounds: Rect) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.bounds = bounds;
        }
        Ok(())
    }

    fn set_window_visible(&mut self, window: WindowId, visible: bool) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.visible = visible;
        }
        Ok(())
    }

    fn set_window_owner(&mut self, window: WindowId, owner: Option<ElementId>) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.owner = owner;
        }
        Ok(())
    }

    fn set_window_region(&mut self, window: WindowId, region: &Region) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.region = Some(region.clone());
        }
        Ok(())
    }

    fn present_frame(&mut self, window: WindowId, _frame: &RgbaBuffer, text: &[TextRun]) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.frames += 1;
            w.last_text = text.to_vec();
        }
        Ok(())
    }

    fn update_layered(&mut self, window: WindowId, location: Point, bitmap: &Bitmap, opacity: u8) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.layered.push((location, opacity, bitmap.format));
        }
        Ok(())
    }

    fn monitor_bounds(&self, area: Rect) -> Rect {
        let overlap = |m: &Rect| {
            let i = m.intersect(area);
            i.width as i64 * i.height as i64
        };
        if let Some(best) = self
            .monitors
            .iter()
            .filter(|m| overlap(m) > 0)
            .max_by_key(|m| overlap(m))
        {
            return *best;
        }
        let center = area.pixel_center();
        self.monitors
            .iter()
            .min_by_key(|m| {
                let c = m.pixel_center();
                let dx = (c.x - center.x) as i64;
                let dy = (c.y - center.y) as i64;
                dx * dx + dy * dy
            })
            .copied()
            .unwrap_or_default()
    }

    fn element(&self, element: ElementId) -> Option<ElementInfo> {
        self.elements.get(&element).copied()
    }

    fn subscribe(&mut self, element: ElementId) -> Result<SubscriptionId> {
        let id = SubscriptionId(self.next());
        self.subscriptions.insert(id, element);
        Ok(id)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
    }

    fn arm_timer(&mut self, _window: WindowId, after: Duration) -> Result<TimerId> {
        let id = TimerId(self.next());
        self.timers.insert(id, self.now_ms + after.as_millis() as u64);
        Ok(id)
    }

    fn cancel_timer(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        self.queue.drain(..).collect()
    }
}
