//! Balloon placement and lifecycle.
//!
//! A [`BalloonWindow`] owns its layout, its anchor target and an optional
//! shadow. Client calls are validated strictly. Placement triggered by the
//! balloon itself (re-anchoring after a property change or a tracked element
//! moving) runs in a nested [`PlacementContext`] where visibility and lock
//! checks are relaxed.

use std::fmt;
use std::time::Duration;

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::{BalloonError, DefaultErrorMessages, ErrorKey, ErrorMessages, Result};
use crate::geometry::{Point, PointF, Rect, Size};
use crate::host::{
    monitor_for_point, ElementEvent, ElementId, Host, HostEvent, TextRun, TimerId, WindowId,
    WindowKind,
};
use crate::layout::{
    body_bounds, compute_outline, AnchorOffset, AnchorQuadrant, LayoutState, Quadrant,
    DEFAULT_ANCHOR_OFFSET,
};
use crate::outline::{Outline, OutlineBuilder};
use crate::placement::{
    anchor_for_rect, flip_correction, reallocate_margin, resolve_offset, resolve_quadrant,
};
use crate::region::Region;
use crate::render::{fill_region, Color, RgbaBuffer};
use crate::settings::BalloonSettings;
use crate::shadow::{ShadowProjection, ShadowSettings};
use crate::surface::{BackStyle, ShapedSurface};
use crate::tracking::{is_showing, visible_bounds, TrackingRegistry};

pub const DEFAULT_SIZE: Size = Size::new(300, 300);
pub const CLOSE_BOX_SIZE: i32 = 18;
pub const CLOSE_BOX_INSET: i32 = 4;

/// What the anchor tip points at. Setting one target replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTarget {
    None,
    Point(Point),
    Rectangle(Rect),
    Element(ElementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalloonState {
    Hidden,
    VisibleUnanchored,
    VisibleAnchoredStatic,
    VisibleAnchoredTracking,
}

/// Paints client content inside the balloon body.
pub trait BalloonContent: fmt::Debug {
    /// Draws into `canvas` within `body` (window-local) and returns the text
    /// the host should render on top.
    fn paint(&self, canvas: &mut RgbaBuffer, body: Rect) -> Vec<TextRun>;
}

/// Re-entrancy depth of a placement call. Depth 0 is a client call.
///
/// A retargeting call is a client call that replaces the target, so the
/// anchor lock of the current target does not apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlacementContext {
    depth: u32,
    retarget: bool,
}

impl PlacementContext {
    const CLIENT: Self = Self {
        depth: 0,
        retarget: false,
    };
    const RETARGET: Self = Self {
        depth: 0,
        retarget: true,
    };

    fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    fn is_relaxed(self) -> bool {
        self.depth > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolve {
    /// Keep the current side and offset unless a concrete one is requested.
    Keep,
    /// Re-evaluate `Auto` requests against the screen.
    Fit,
}

#[derive(Debug)]
pub struct BalloonWindow {
    messages: Box<dyn ErrorMessages>,
    window: Option<WindowId>,
    owner: Option<ElementId>,
    visible: bool,
    loaded: bool,
    location: Point,
    surface: ShapedSurface,
    layout: LayoutState,
    anchor_tip: Point,
    anchor_quadrant: AnchorQuadrant,
    anchor_quadrant_base: Quadrant,
    anchor_offset: AnchorOffset,
    anchor_offset_base: i32,
    corner_radius: i32,
    anchor_margin: i32,
    timeout: Duration,
    timer: Option<TimerId>,
    close_box: bool,
    allow_obscure: bool,
    move_with_target: bool,
    target: AnchorTarget,
    target_rect: Option<Rect>,
    pivot: Point,
    tracking: TrackingRegistry,
    suspended: bool,
    shadow: ShadowProjection,
    content: Option<Box<dyn BalloonContent>>,
}

impl Default for BalloonWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl BalloonWindow {
    pub fn new() -> Self {
        Self::with_messages(Box::new(DefaultErrorMessages))
    }

    pub fn with_messages(messages: Box<dyn ErrorMessages>) -> Self {
        let layout = LayoutState::default();
        Self {
            messages,
            window: None,
            owner: None,
            visible: false,
            loaded: false,
            location: Point::default(),
            surface: ShapedSurface::new(DEFAULT_SIZE),
            layout,
            anchor_tip: Point::default(),
            anchor_quadrant: AnchorQuadrant::Auto,
            anchor_quadrant_base: layout.quadrant,
            anchor_offset: AnchorOffset::Auto,
            anchor_offset_base: layout.offset,
            corner_radius: layout.corner_radius,
            anchor_margin: layout.anchor_margin,
            timeout: Duration::ZERO,
            timer: None,
            close_box: true,
            allow_obscure: true,
            move_with_target: true,
            target: AnchorTarget::None,
            target_rect: None,
            pivot: Point::default(),
            tracking: TrackingRegistry::new(),
            suspended: false,
            shadow: ShadowProjection::new(ShadowSettings::default()),
            content: None,
        }
    }

    /// Hidden balloon configured from `settings`. Every value goes through
    /// the same validation as the individual setters.
    pub fn from_settings(settings: &BalloonSettings) -> Result<Self> {
        let mut balloon = Self::new();
        balloon.store_size(settings.size)?;
        balloon.store_corner_radius(settings.corner_radius)?;
        balloon.store_anchor_margin(settings.anchor_margin)?;
        balloon.store_anchor_quadrant_base(settings.anchor_quadrant_base)?;
        balloon.store_anchor_offset_base(settings.anchor_offset_base)?;
        balloon.anchor_quadrant = settings.anchor_quadrant;
        balloon.store_anchor_offset(settings.anchor_offset)?;
        balloon.timeout = Duration::from_millis(settings.timeout_ms);
        balloon.allow_obscure = settings.allow_obscure;
        balloon.move_with_target = settings.move_with_target;
        balloon.close_box = settings.close_box;
        let style = balloon.surface.style_mut();
        style.back_color = settings.back_color;
        style.back_style = settings.back_style;
        style.border_color = settings.border_color;
        style.border_width = settings.border_width;
        balloon.store_shadow_settings(settings.shadow)?;
        Ok(balloon)
    }

    // ---- state -----------------------------------------------------------

    pub fn state(&self) -> BalloonState {
        if !self.visible {
            return BalloonState::Hidden;
        }
        match self.target {
            AnchorTarget::Element(_) if self.tracking.is_active() => BalloonState::VisibleAnchoredTracking,
            AnchorTarget::Element(_) | AnchorTarget::Rectangle(_) => BalloonState::VisibleAnchoredStatic,
            AnchorTarget::Point(_) | AnchorTarget::None => BalloonState::VisibleUnanchored,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while hidden because the tracked element disappeared.
    pub fn is_tracking_suspended(&self) -> bool {
        self.suspended
    }

    pub fn target(&self) -> AnchorTarget {
        self.target
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn size(&self) -> Size {
        self.surface.size()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_location_size(self.location, self.surface.size())
    }

    /// Screen position of the anchor tip.
    pub fn anchor_point(&self) -> Point {
        self.location.offset(self.anchor_tip.x, self.anchor_tip.y)
    }

    pub fn point_to_screen(&self, local: Point) -> Point {
        local.offset(self.location.x, self.location.y)
    }

    pub fn point_to_client(&self, screen: Point) -> Point {
        screen.offset(-self.location.x, -self.location.y)
    }

    /// Concrete layout used for the current outline.
    pub fn layout(&self) -> LayoutState {
        self.layout
    }

    /// Side the tip is on right now.
    pub fn quadrant(&self) -> Quadrant {
        self.layout.quadrant
    }

    pub fn anchor_quadrant(&self) -> AnchorQuadrant {
        self.anchor_quadrant
    }

    pub fn anchor_quadrant_base(&self) -> Quadrant {
        self.anchor_quadrant_base
    }

    pub fn anchor_offset(&self) -> AnchorOffset {
        self.anchor_offset
    }

    pub fn anchor_offset_base(&self) -> i32 {
        self.anchor_offset_base
    }

    pub fn corner_radius(&self) -> i32 {
        self.corner_radius
    }

    pub fn anchor_margin(&self) -> i32 {
        self.anchor_margin
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn close_box(&self) -> bool {
        self.close_box
    }

    pub fn allow_obscure(&self) -> bool {
        self.allow_obscure
    }

    pub fn move_with_target(&self) -> bool {
        self.move_with_target
    }

    pub fn shadow(&self) -> &ShadowProjection {
        &self.shadow
    }

    pub fn surface(&self) -> &ShapedSurface {
        &self.surface
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.surface.outline()
    }

    /// Window-local content area: the window minus the anchor margin strip.
    pub fn balloon_bounds(&self) -> Rect {
        let size = self.surface.size();
        body_bounds(
            self.layout.quadrant,
            self.anchor_margin,
            Rect::new(0, 0, size.width, size.height),
        )
    }

    /// Window-local rectangle of the close box.
    pub fn close_box_bounds(&self) -> Rect {
        let width = self.surface.size().width;
        let x = width - CLOSE_BOX_SIZE - CLOSE_BOX_INSET;
        let (x, y) = match self.layout.quadrant {
            Quadrant::Top => (x, self.anchor_margin + CLOSE_BOX_INSET),
            Quadrant::Bottom | Quadrant::Left => (x, CLOSE_BOX_INSET),
            Quadrant::Right => (x - self.anchor_margin, CLOSE_BOX_INSET),
        };
        Rect::new(x, y, CLOSE_BOX_SIZE, CLOSE_BOX_SIZE)
    }

    fn is_locked(&self) -> bool {
        matches!(self.target, AnchorTarget::Element(_)) && self.move_with_target
    }

    // ---- showing ---------------------------------------------------------

    /// Shows the balloon with its tip on `point` (screen coordinates).
    pub fn show_at_point(&mut self, host: &mut dyn Host, point: Point) -> Result<()> {
        let screen = monitor_for_point(&*host, point);
        if !screen.contains_point(point) {
            return Err(self.point_off_screen(point));
        }
        self.move_anchor_to_pivot(host, point, point, PlacementContext::RETARGET)?;
        self.clear_target(host);
        self.target = AnchorTarget::Point(point);
        debug!(x = point.x, y = point.y, "balloon anchored to point");
        self.show_window(host)
    }

    /// Shows the balloon anchored to a screen rectangle.
    ///
    /// The tip goes to the center of the on-screen part of `rect`, or just
    /// outside it when obscuring is not allowed.
    pub fn show_at_rect(&mut self, host: &mut dyn Host, rect: Rect) -> Result<()> {
        self.check_rect(&*host, rect)?;
        self.move_anchor_to_rect_in(host, rect, PlacementContext::RETARGET)?;
        let placed = self.target_rect;
        self.clear_target(host);
        self.target = AnchorTarget::Rectangle(rect);
        self.target_rect = placed;
        debug!(rect = ?rect, "balloon anchored to rectangle");
        self.show_window(host)
    }

    /// Shows the balloon anchored to an on-screen element and, when
    /// [`move_with_target`](Self::move_with_target) is set, follows it.
    pub fn show_at_element(&mut self, host: &mut dyn Host, element: ElementId) -> Result<()> {
        let visible = self.validate_element(&*host, element)?;
        self.move_anchor_to_rect_in(host, visible, PlacementContext::CLIENT.nested())?;
        if self.target != AnchorTarget::Element(element) {
            let placed = self.target_rect;
            self.clear_target(host);
            self.target_rect = placed;
        }
        self.bind_element(host, element)?;
        self.suspended = false;
        debug!(element = %element, "balloon anchored to element");
        self.show_window(host)
    }

    /// Hides the balloon and forgets its target. The window is kept.
    pub fn hide(&mut self, host: &mut dyn Host) -> Result<()> {
        self.clear_target(host);
        self.hide_window(host)
    }

    /// Re-shows a balloon hidden because its tracked element disappeared.
    pub fn resume_tracking(&mut self, host: &mut dyn Host) -> Result<()> {
        if !self.suspended {
            return Ok(());
        }
        let AnchorTarget::Element(element) = self.target else {
            self.suspended = false;
            return Ok(());
        };
        let visible = self.validate_element(&*host, element)?;
        self.move_anchor_to_rect_in(host, visible, PlacementContext::CLIENT.nested())?;
        self.suspended = false;
        info!(element = %element, "layout tracking resumed");
        self.show_window(host)
    }

    /// Destroys the balloon window and its shadow.
    pub fn release(mut self, host: &mut dyn Host) -> Result<()> {
        self.hide(host)?;
        self.shadow.release(host);
        if let Some(id) = self.window.take() {
            host.destroy_window(id);
            debug!(window = id.0, "balloon window destroyed");
        }
        Ok(())
    }

    // ---- anchor movement -------------------------------------------------

    /// Moves the tip to `point`. Fails while locked to a tracked element.
    pub fn move_anchor_to(&mut self, host: &mut dyn Host, point: Point) -> Result<()> {
        self.move_anchor_to_pivot(host, point, point, PlacementContext::CLIENT)?;
        self.target = AnchorTarget::Point(point);
        self.target_rect = None;
        self.refresh(host)
    }

    /// Moves the tip to a rectangle without changing visibility.
    pub fn move_anchor_to_rect(&mut self, host: &mut dyn Host, rect: Rect) -> Result<()> {
        self.check_rect(&*host, rect)?;
        self.move_anchor_to_rect_in(host, rect, PlacementContext::CLIENT)?;
        self.target = AnchorTarget::Rectangle(rect);
        self.refresh(host)
    }

    pub fn offset_anchor_by(&mut self, host: &mut dyn Host, dx: i32, dy: i32) -> Result<()> {
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        let point = self.anchor_point().offset(dx, dy);
        self.move_anchor_to(host, point)
    }

    /// Moves the tip to `point` if the balloon is showing somewhere else.
    pub fn set_anchor_point(&mut self, host: &mut dyn Host, point: Point) -> Result<()> {
        if self.visible && self.anchor_point() != point {
            self.move_anchor_to(host, point)?;
        }
        Ok(())
    }

    fn check_rect(&self, host: &dyn Host, rect: Rect) -> Result<()> {
        if rect.is_empty() {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "rect",
                ErrorKey::EmptyRectangle,
                format!("{rect:?}"),
            ));
        }
        if !host.monitor_bounds(rect).intersects(rect) {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "rect",
                ErrorKey::PointOffScreen,
                format!("{rect:?}"),
            ));
        }
        Ok(())
    }

    fn point_off_screen(&self, point: Point) -> BalloonError {
        BalloonError::invalid_argument(
            self.messages.as_ref(),
            "point",
            ErrorKey::PointOffScreen,
            format!("({}, {})", point.x, point.y),
        )
    }

    /// Visible bounds of `element`, or the reason it cannot be a target.
    fn validate_element(&self, host: &dyn Host, element: ElementId) -> Result<Rect> {
        let messages = self.messages.as_ref();
        let Some(info) = host.element(element) else {
            return Err(BalloonError::target_not_visible(messages, element, ErrorKey::TargetInvisible));
        };
        if !is_showing(host, element) {
            return Err(BalloonError::target_not_visible(messages, element, ErrorKey::TargetInvisible));
        }
        let screen = host.monitor_bounds(info.screen_bounds);
        if !screen.intersects(info.screen_bounds) {
            return Err(BalloonError::target_not_visible(messages, element, ErrorKey::TargetOffScreen));
        }
        let visible = visible_bounds(host, element, screen);
        if visible.is_empty() {
            return Err(BalloonError::target_not_visible(messages, element, ErrorKey::TargetClipped));
        }
        Ok(visible)
    }

    fn bind_element(&mut self, host: &mut dyn Host, element: ElementId) -> Result<()> {
        self.target = AnchorTarget::Element(element);
        if self.owner != Some(element) {
            self.owner = Some(element);
            if let Some(id) = self.window {
                host.set_window_owner(id, self.owner)?;
            }
        }
        if self.move_with_target {
            self.tracking.register(host, element)?;
        }
        Ok(())
    }

    fn clear_target(&mut self, host: &mut dyn Host) {
        self.tracking.unregister_all(host);
        self.target = AnchorTarget::None;
        self.target_rect = None;
        self.suspended = false;
    }

    fn move_anchor_to_rect_in(
        &mut self,
        host: &mut dyn Host,
        rect: Rect,
        ctx: PlacementContext,
    ) -> Result<()> {
        let screen = host.monitor_bounds(rect);
        self.ensure_layout(host)?;
        let Some((anchor, pivot)) =
            anchor_for_rect(rect, screen, self.layout.quadrant, self.allow_obscure)
        else {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "rect",
                ErrorKey::PointOffScreen,
                format!("{rect:?}"),
            ));
        };
        self.move_anchor_to_pivot(host, anchor, pivot, ctx)?;
        self.target_rect = Some(rect.intersect(screen));
        Ok(())
    }

    /// Positions the window so the tip lands on `point`.
    ///
    /// If the window then leaves its monitor, the layout is re-evaluated
    /// once; when that moves the tip, the window is shifted back onto
    /// `point` and mirrored across `pivot` on the axis that changed.
    fn move_anchor_to_pivot(
        &mut self,
        host: &mut dyn Host,
        point: Point,
        pivot: Point,
        ctx: PlacementContext,
    ) -> Result<()> {
        let screen = monitor_for_point(&*host, point);
        if !ctx.is_relaxed() {
            if !ctx.retarget && self.is_locked() {
                return Err(BalloonError::invalid_state(
                    self.messages.as_ref(),
                    ErrorKey::AnchorLocked,
                    format!("({}, {})", point.x, point.y),
                ));
            }
            if !screen.contains_point(point) {
                return Err(self.point_off_screen(point));
            }
        }

        let previous = self.location;
        if let Err(err) = self.place_tip(host, point, pivot, screen) {
            self.location = previous;
            return Err(err);
        }
        self.pivot = pivot;
        self.apply_bounds(host)
    }

    fn place_tip(&mut self, host: &mut dyn Host, point: Point, pivot: Point, screen: Rect) -> Result<()> {
        self.ensure_layout(host)?;
        let tip = self.anchor_point();
        self.location = self.location.offset(point.x - tip.x, point.y - tip.y);
        if screen.contains_rect(self.bounds()) {
            return Ok(());
        }
        let before = self.anchor_tip;
        self.recalc_layout(host, Resolve::Fit)?;
        if self.anchor_tip != before {
            let (dx, dy) = flip_correction(point, pivot, self.anchor_point());
            self.location = self.location.offset(dx, dy);
            debug!(dx, dy, "balloon shifted after reorientation");
        }
        Ok(())
    }

    // ---- layout ----------------------------------------------------------

    fn ensure_layout(&mut self, host: &mut dyn Host) -> Result<()> {
        if self.surface.outline().is_none() {
            self.recalc_layout(host, Resolve::Keep)?;
        }
        Ok(())
    }

    /// Resolves quadrant and offset, moves the margin strip to the new side
    /// and rebuilds the outline. Nothing is committed if the layout fails.
    fn recalc_layout(&mut self, host: &mut dyn Host, resolve: Resolve) -> Result<()> {
        let bounds = self.bounds();
        let screen = host.monitor_bounds(bounds);
        let quadrant = match resolve {
            Resolve::Keep => self.anchor_quadrant.concrete().unwrap_or(self.layout.quadrant),
            Resolve::Fit => resolve_quadrant(self.anchor_quadrant, self.layout.quadrant, bounds, screen),
        };
        let size = reallocate_margin(
            self.surface.size(),
            self.layout.quadrant,
            self.layout.anchor_margin,
            quadrant,
            self.anchor_margin,
        );
        let sized = Rect::from_location_size(self.location, size);
        let offset = match (resolve, self.anchor_offset) {
            (Resolve::Keep, AnchorOffset::Auto) => self.layout.offset,
            (_, requested) => resolve_offset(
                requested,
                self.layout.offset,
                quadrant,
                self.corner_radius,
                sized,
                screen,
            ),
        };
        let state = LayoutState {
            quadrant,
            offset,
            corner_radius: self.corner_radius,
            anchor_margin: self.anchor_margin,
        };
        let shape = compute_outline(&state, Rect::new(0, 0, size.width, size.height))
            .map_err(|err| BalloonError::from_layout(self.messages.as_ref(), err))?;

        if quadrant != self.layout.quadrant {
            info!(from = ?self.layout.quadrant, to = ?quadrant, "anchor quadrant changed");
        }
        let resized = self.surface.resize(size);
        self.layout = state;
        self.anchor_tip = shape.anchor_tip;
        let changed = self.surface.set_outline(shape.outline);

        if resized && self.shadow.window().is_some() {
            self.shadow.on_owner_resized(host, size)?;
        }
        if changed && self.shadow.window().is_some() {
            if let Some(outline) = self.surface.outline() {
                self.shadow
                    .on_owner_outline_changed(host, self.messages.as_ref(), outline)?;
            }
        }
        Ok(())
    }

    /// Re-anchors a visible balloon after a geometry property changed.
    fn relayout_visible(&mut self, host: &mut dyn Host) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        let ctx = PlacementContext::CLIENT.nested();
        match self.target_rect {
            Some(rect) => self.move_anchor_to_rect_in(host, rect, ctx)?,
            None => {
                let point = self.anchor_point();
                self.move_anchor_to_pivot(host, point, point, ctx)?;
            }
        }
        self.paint(host)
    }

    // ---- window plumbing -------------------------------------------------

    fn ensure_window(&mut self, host: &mut dyn Host) -> Result<WindowId> {
        if let Some(id) = self.window {
            return Ok(id);
        }
        let id = host.create_window(WindowKind::Balloon)?;
        self.window = Some(id);
        if self.owner.is_some() {
            host.set_window_owner(id, self.owner)?;
        }
        debug!(window = id.0, "balloon window created");
        Ok(id)
    }

    fn apply_bounds(&mut self, host: &mut dyn Host) -> Result<()> {
        if let Some(id) = self.window {
            host.set_window_bounds(id, self.bounds())?;
        }
        if self.shadow.window().is_some() {
            self.shadow.on_owner_resized(host, self.surface.size())?;
            self.shadow.on_owner_moved(host, self.location)?;
        }
        Ok(())
    }

    fn show_window(&mut self, host: &mut dyn Host) -> Result<()> {
        let id = self.ensure_window(host)?;
        if !self.loaded {
            self.loaded = true;
            debug!(
                quadrant = ?self.anchor_quadrant_base,
                offset = self.anchor_offset_base,
                "balloon loaded"
            );
        }
        self.ensure_layout(host)?;
        self.apply_bounds(host)?;
        self.paint(host)?;
        if self.visible {
            return Ok(());
        }
        host.set_window_visible(id, true)?;
        self.visible = true;
        self.arm_timer(host)?;
        self.show_shadow(host)?;
        info!(target = ?self.target, bounds = ?self.bounds(), "balloon shown");
        Ok(())
    }

    fn hide_window(&mut self, host: &mut dyn Host) -> Result<()> {
        self.cancel_timer(host);
        if !self.visible {
            return Ok(());
        }
        if let Some(id) = self.window {
            host.set_window_visible(id, false)?;
        }
        self.visible = false;
        self.shadow.hide(host)?;
        info!("balloon hidden");
        Ok(())
    }

    fn show_shadow(&mut self, host: &mut dyn Host) -> Result<()> {
        if !self.shadow.settings().enabled {
            return Ok(());
        }
        if let Some(outline) = self.surface.outline() {
            self.shadow.show(
                host,
                self.messages.as_ref(),
                self.location,
                self.surface.size(),
                outline,
            )?;
        }
        Ok(())
    }

    fn refresh(&mut self, host: &mut dyn Host) -> Result<()> {
        if self.visible {
            self.paint(host)?;
        }
        Ok(())
    }

    /// Applies the window region and presents a freshly painted frame.
    fn paint(&mut self, host: &mut dyn Host) -> Result<()> {
        let Some(id) = self.window else {
            return Ok(());
        };
        self.ensure_layout(host)?;
        let mut frame = self.surface.paint(self.messages.as_ref())?;
        if self.close_box {
            draw_close_box(&mut frame.pixels, self.close_box_bounds());
        }
        let text = match self.content.as_ref() {
            Some(content) => content.paint(&mut frame.pixels, self.balloon_bounds()),
            None => Vec::new(),
        };
        host.set_window_region(id, &frame.region)?;
        host.present_frame(id, &frame.pixels, &text)
    }

    fn arm_timer(&mut self, host: &mut dyn Host) -> Result<()> {
        self.cancel_timer(host);
        if self.timeout.is_zero() {
            return Ok(());
        }
        let Some(id) = self.window else {
            return Ok(());
        };
        self.timer = Some(host.arm_timer(id, self.timeout)?);
        debug!(timeout_ms = self.timeout.as_millis() as u64, "dismiss timer armed");
        Ok(())
    }

    fn cancel_timer(&mut self, host: &mut dyn Host) {
        if let Some(timer) = self.timer.take() {
            host.cancel_timer(timer);
            debug!("dismiss timer cancelled");
        }
    }

    // ---- events ----------------------------------------------------------

    /// Handles one host event. Returns `true` if it was addressed to this balloon.
    pub fn dispatch(&mut self, host: &mut dyn Host, event: &HostEvent) -> Result<bool> {
        match *event {
            HostEvent::Element(event) => self.on_element_event(host, event),
            HostEvent::Timer(timer) if self.timer == Some(timer) => {
                self.timer = None;
                info!("dismiss timeout elapsed");
                self.hide(host)?;
                Ok(true)
            }
            HostEvent::CloseRequested(window) if self.window == Some(window) => {
                self.hide(host)?;
                Ok(true)
            }
            HostEvent::Click { window, point } if self.window == Some(window) => {
                if self.visible && self.close_box && self.close_box_bounds().contains_point(point) {
                    self.hide(host)?;
                    return Ok(true);
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Drains the host queue into [`dispatch`](Self::dispatch).
    pub fn pump(&mut self, host: &mut dyn Host) -> Result<usize> {
        let mut handled = 0;
        for event in host.poll_events() {
            if self.dispatch(host, &event)? {
                handled += 1;
            }
        }
        Ok(handled)
    }

    fn on_element_event(&mut self, host: &mut dyn Host, event: ElementEvent) -> Result<bool> {
        if !self.tracking.owns(event.subscription) {
            return Ok(false);
        }
        let AnchorTarget::Element(element) = self.target else {
            return Ok(false);
        };
        let visible = match host.element(element) {
            Some(info) if is_showing(&*host, element) => {
                let screen = host.monitor_bounds(info.screen_bounds);
                visible_bounds(&*host, element, screen)
            }
            _ => Rect::default(),
        };
        debug!(element = %element, change = ?event.change, visible = ?visible, "tracked element changed");

        if visible.is_empty() {
            if self.visible {
                self.suspended = true;
                self.hide_window(host)?;
                info!(element = %element, "layout tracking suspended");
            }
            return Ok(true);
        }

        self.move_anchor_to_rect_in(host, visible, PlacementContext::CLIENT.nested())?;
        if self.visible {
            self.paint(host)?;
        } else if self.suspended {
            self.suspended = false;
            info!(element = %element, "layout tracking resumed");
            self.show_window(host)?;
        }
        Ok(true)
    }

    // ---- properties ------------------------------------------------------

    fn store_size(&mut self, size: Size) -> Result<bool> {
        if size.is_empty() {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "size",
                ErrorKey::EmptyBounds,
                format!("{}x{}", size.width, size.height),
            ));
        }
        Ok(self.surface.resize(size))
    }

    pub fn set_size(&mut self, host: &mut dyn Host, size: Size) -> Result<()> {
        if self.store_size(size)? {
            self.relayout_visible(host)?;
        }
        Ok(())
    }

    pub fn set_anchor_quadrant(&mut self, host: &mut dyn Host, quadrant: AnchorQuadrant) -> Result<()> {
        if self.anchor_quadrant == quadrant {
            return Ok(());
        }
        self.anchor_quadrant = quadrant;
        self.surface.invalidate();
        self.relayout_visible(host)
    }

    fn store_anchor_quadrant_base(&mut self, quadrant: AnchorQuadrant) -> Result<bool> {
        let Some(concrete) = quadrant.concrete() else {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "anchor_quadrant_base",
                ErrorKey::AutoBaseQuadrant,
                "",
            ));
        };
        if self.loaded {
            debug!("anchor quadrant base ignored after first display");
            return Ok(false);
        }
        if self.anchor_quadrant_base == concrete {
            return Ok(false);
        }
        self.anchor_quadrant_base = concrete;
        self.layout.quadrant = concrete;
        self.surface.invalidate();
        Ok(true)
    }

    /// Starting side for `Auto`. Only honoured before the first show.
    pub fn set_anchor_quadrant_base(&mut self, quadrant: AnchorQuadrant) -> Result<()> {
        self.store_anchor_quadrant_base(quadrant).map(|_| ())
    }

    fn store_anchor_offset(&mut self, offset: AnchorOffset) -> Result<bool> {
        if let AnchorOffset::Fixed(value) = offset {
            if value < 0 {
                return Err(BalloonError::invalid_argument(
                    self.messages.as_ref(),
                    "anchor_offset",
                    ErrorKey::OffsetOutOfRange,
                    value,
                ));
            }
        }
        if self.anchor_offset == offset {
            return Ok(false);
        }
        self.anchor_offset = offset;
        if offset == AnchorOffset::Auto {
            self.layout.offset = DEFAULT_ANCHOR_OFFSET;
        }
        self.surface.invalidate();
        Ok(true)
    }

    pub fn set_anchor_offset(&mut self, host: &mut dyn Host, offset: AnchorOffset) -> Result<()> {
        if self.store_anchor_offset(offset)? {
            self.relayout_visible(host)?;
        }
        Ok(())
    }

    fn store_anchor_offset_base(&mut self, offset: i32) -> Result<bool> {
        if offset < 0 {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "anchor_offset_base",
                ErrorKey::AutoBaseOffset,
                offset,
            ));
        }
        if self.loaded {
            debug!("anchor offset base ignored after first display");
            return Ok(false);
        }
        self.anchor_offset_base = offset;
        self.layout.offset = offset;
        self.surface.invalidate();
        Ok(true)
    }

    /// Starting offset for `Auto`. Only honoured before the first show.
    pub fn set_anchor_offset_base(&mut self, offset: i32) -> Result<()> {
        self.store_anchor_offset_base(offset).map(|_| ())
    }

    fn store_anchor_margin(&mut self, margin: i32) -> Result<bool> {
        if margin < 0 {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "anchor_margin",
                ErrorKey::NegativeMargin,
                margin,
            ));
        }
        if self.anchor_margin == margin {
            return Ok(false);
        }
        self.anchor_margin = margin;
        self.surface.invalidate();
        Ok(true)
    }

    pub fn set_anchor_margin(&mut self, host: &mut dyn Host, margin: i32) -> Result<()> {
        if self.store_anchor_margin(margin)? {
            self.relayout_visible(host)?;
        }
        Ok(())
    }

    fn store_corner_radius(&mut self, radius: i32) -> Result<bool> {
        if radius <= 0 {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "corner_radius",
                ErrorKey::ZeroCornerRadius,
                radius,
            ));
        }
        if self.corner_radius == radius {
            return Ok(false);
        }
        self.corner_radius = radius;
        self.surface.invalidate();
        Ok(true)
    }

    pub fn set_corner_radius(&mut self, host: &mut dyn Host, radius: i32) -> Result<()> {
        if self.store_corner_radius(radius)? {
            self.relayout_visible(host)?;
        }
        Ok(())
    }

    /// Auto-hide delay, zero to stay up. Applies from the next show.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_close_box(&mut self, host: &mut dyn Host, close_box: bool) -> Result<()> {
        if self.close_box == close_box {
            return Ok(());
        }
        self.close_box = close_box;
        self.refresh(host)
    }

    pub fn set_allow_obscure(&mut self, host: &mut dyn Host, allow: bool) -> Result<()> {
        if self.allow_obscure == allow {
            return Ok(());
        }
        self.allow_obscure = allow;
        if self.visible {
            if let Some(rect) = self.target_rect {
                self.move_anchor_to_rect_in(host, rect, PlacementContext::CLIENT.nested())?;
                self.paint(host)?;
            }
        }
        Ok(())
    }

    pub fn set_move_with_target(&mut self, host: &mut dyn Host, follow: bool) -> Result<()> {
        if self.move_with_target == follow {
            return Ok(());
        }
        self.move_with_target = follow;
        let AnchorTarget::Element(element) = self.target else {
            return Ok(());
        };
        if follow {
            self.tracking.register(host, element)?;
            if self.visible {
                let visible = self.validate_element(&*host, element)?;
                self.move_anchor_to_rect_in(host, visible, PlacementContext::CLIENT.nested())?;
                self.paint(host)?;
            }
        } else {
            self.tracking.unregister_all(host);
        }
        Ok(())
    }

    fn store_shadow_settings(&mut self, settings: ShadowSettings) -> Result<()> {
        if settings.margin < 0 {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "shadow_margin",
                ErrorKey::NegativeMargin,
                settings.margin,
            ));
        }
        self.shadow = ShadowProjection::new(settings);
        Ok(())
    }

    fn update_shadow(&mut self, host: &mut dyn Host, settings: ShadowSettings) -> Result<()> {
        if settings.margin < 0 {
            return Err(BalloonError::invalid_argument(
                self.messages.as_ref(),
                "shadow_margin",
                ErrorKey::NegativeMargin,
                settings.margin,
            ));
        }
        let was_enabled = self.shadow.settings().enabled;
        self.shadow
            .update_settings(host, self.messages.as_ref(), settings, self.location)?;
        if self.visible && settings.enabled && !was_enabled {
            self.show_shadow(host)?;
        } else if !settings.enabled && was_enabled {
            self.shadow.hide(host)?;
        }
        Ok(())
    }

    pub fn set_shadow(&mut self, host: &mut dyn Host, enabled: bool) -> Result<()> {
        let settings = ShadowSettings {
            enabled,
            ..self.shadow.settings()
        };
        self.update_shadow(host, settings)
    }

    pub fn set_shadow_color(&mut self, host: &mut dyn Host, color: Color) -> Result<()> {
        let settings = ShadowSettings {
            color,
            ..self.shadow.settings()
        };
        self.update_shadow(host, settings)
    }

    pub fn set_shadow_margin(&mut self, host: &mut dyn Host, margin: i32) -> Result<()> {
        let settings = ShadowSettings {
            margin,
            ..self.shadow.settings()
        };
        self.update_shadow(host, settings)
    }

    pub fn set_back_color(&mut self, host: &mut dyn Host, color: Color) -> Result<()> {
        self.surface.style_mut().back_color = color;
        self.refresh(host)
    }

    pub fn set_back_style(&mut self, host: &mut dyn Host, style: BackStyle) -> Result<()> {
        self.surface.style_mut().back_style = style;
        self.refresh(host)
    }

    pub fn set_border_color(&mut self, host: &mut dyn Host, color: Color) -> Result<()> {
        self.surface.style_mut().border_color = color;
        self.refresh(host)
    }

    pub fn set_border_width(&mut self, host: &mut dyn Host, width: u32) -> Result<()> {
        self.surface.style_mut().border_width = width.max(1);
        self.refresh(host)
    }

    pub fn set_background_image(&mut self, host: &mut dyn Host, image: Option<RgbaImage>) -> Result<()> {
        self.surface.style_mut().background_image = image;
        self.refresh(host)
    }

    pub fn set_content(&mut self, host: &mut dyn Host, content: Option<Box<dyn BalloonContent>>) -> Result<()> {
        self.content = content;
        self.refresh(host)
    }
}

fn draw_close_box(canvas: &mut RgbaBuffer, rect: Rect) {
    let left = rect.x as f64 + 0.5;
    let top = rect.y as f64 + 0.5;
    let right = rect.right() as f64 - 1.5;
    let bottom = rect.bottom() as f64 - 1.5;

    let mut frame = OutlineBuilder::new();
    frame
        .line(PointF::new(left, top), PointF::new(right, top))
        .line(PointF::new(right, top), PointF::new(right, bottom))
        .line(PointF::new(right, bottom), PointF::new(left, bottom));
    fill_region(canvas, &Region::stroke(&frame.close(), 1.0), Color::rgb(128, 128, 128));

    let inset = 4.0;
    let strokes = [
        (PointF::new(left + inset, top + inset), PointF::new(right - inset, bottom - inset)),
        (PointF::new(right - inset, top + inset), PointF::new(left + inset, bottom - inset)),
    ];
    for (from, to) in strokes {
        let mut cross = OutlineBuilder::new();
        cross.line(from, to);
        fill_region(canvas, &Region::stroke(&cross.close(), 1.5), Color::BLACK);
    }
}
