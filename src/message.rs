//! Ready-made balloon with an icon, a bold title and a message.

use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::balloon::{BalloonContent, BalloonWindow};
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::host::{monitor_for_point, ElementId, Host, TextRun};
use crate::render::{Color, RgbaBuffer};

pub const MESSAGE_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const ICON_SIZE: u32 = 16;
const MIN_SCALE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageBalloonOptions {
    pub horizontal_auto_scale: bool,
    pub vertical_auto_scale: bool,
    pub show_shadow: bool,
    pub allow_obscure: bool,
    /// Auto-hide after [`MESSAGE_TIMEOUT`].
    pub timeout: bool,
}

impl Default for MessageBalloonOptions {
    fn default() -> Self {
        Self {
            horizontal_auto_scale: true,
            vertical_auto_scale: true,
            show_shadow: true,
            allow_obscure: true,
            timeout: false,
        }
    }
}

/// Measures text in the host's message font.
pub trait TextMeasure {
    /// Size of `text` when wrapped at `max_width` (unbounded when `None`).
    fn measure(&self, text: &str, max_width: Option<i32>, bold: bool) -> Size;
}

/// Where each element of a message balloon goes, window-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLayout {
    pub icon: Rect,
    pub title: Rect,
    pub message: Rect,
}

impl MessageLayout {
    pub fn for_body(body: Rect) -> Self {
        let icon = Rect::new(body.x + 12, body.y + 7, ICON_SIZE as i32, ICON_SIZE as i32);
        let title = Rect::new(body.x + 34, body.y + 9, (body.width - 60).max(0), 15);
        let message_at = Point::new(body.x + 12, body.y + 29);
        let message = Rect::new(
            message_at.x,
            message_at.y,
            (body.width - message_at.x * 3 - 2).max(0),
            (body.height - message_at.y - 6).max(0),
        );
        Self { icon, title, message }
    }
}

#[derive(Debug, Clone)]
pub struct MessageContent {
    pub title: String,
    pub message: String,
    pub icon: Option<RgbaImage>,
    pub text_color: Color,
}

impl MessageContent {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            icon: None,
            text_color: Color::BLACK,
        }
    }

    pub fn with_icon(mut self, icon: RgbaImage) -> Self {
        self.icon = Some(icon);
        self
    }
}

impl BalloonContent for MessageContent {
    fn paint(&self, canvas: &mut RgbaBuffer, body: Rect) -> Vec<TextRun> {
        let layout = MessageLayout::for_body(body);
        if let Some(icon) = self.icon.as_ref() {
            let scaled = if icon.dimensions() == (ICON_SIZE, ICON_SIZE) {
                icon.clone()
            } else {
                imageops::resize(icon, ICON_SIZE, ICON_SIZE, FilterType::Triangle)
            };
            for (x, y, px) in scaled.enumerate_pixels() {
                let [r, g, b, a] = px.0;
                canvas.blend_pixel(layout.icon.x + x as i32, layout.icon.y + y as i32, Color::rgba(r, g, b, a));
            }
        }

        let mut runs = Vec::new();
        if !self.title.is_empty() {
            runs.push(TextRun {
                text: self.title.clone(),
                bounds: layout.title,
                color: self.text_color,
                bold: true,
            });
        }
        if !self.message.is_empty() {
            runs.push(TextRun {
                text: self.message.clone(),
                bounds: layout.message,
                color: self.text_color,
                bold: false,
            });
        }
        runs
    }
}

/// Text area size for `message`: measured when auto-scaling, clamped to
/// between 100 pixels and a third of the screen on each axis.
pub fn scale_factor(
    measure: &dyn TextMeasure,
    message: &str,
    options: MessageBalloonOptions,
    screen: Rect,
) -> Size {
    let max = Size::new((screen.width / 3).max(MIN_SCALE), (screen.height / 3).max(MIN_SCALE));
    let width = if options.horizontal_auto_scale {
        measure.measure(message, None, false).width
    } else {
        0
    };
    let width = width.clamp(MIN_SCALE, max.width);
    let height = if options.vertical_auto_scale {
        measure.measure(message, Some(width), false).height
    } else {
        0
    };
    Size::new(width, height.clamp(MIN_SCALE, max.height))
}

/// Window size for a text area of `scale`, leaving room for the corners,
/// the anchor margin and the title line.
pub fn window_size(scale: Size, corner_radius: i32, anchor_margin: i32) -> Size {
    Size::new(
        scale.width + corner_radius * 2 + 25,
        scale.height + anchor_margin * 2 + 20,
    )
}

/// Builds and shows message balloons.
pub struct MessageBalloon;

impl MessageBalloon {
    /// Hidden balloon sized for `message` on `screen`.
    pub fn create(
        host: &mut dyn Host,
        measure: &dyn TextMeasure,
        content: MessageContent,
        options: MessageBalloonOptions,
        screen: Rect,
    ) -> Result<BalloonWindow> {
        let mut balloon = BalloonWindow::new();
        let scale = scale_factor(measure, &content.message, options, screen);
        let size = window_size(scale, balloon.corner_radius(), balloon.anchor_margin());
        debug!(width = size.width, height = size.height, "message balloon sized");
        balloon.set_size(host, size)?;
        balloon.set_shadow(host, options.show_shadow)?;
        balloon.set_allow_obscure(host, options.allow_obscure)?;
        if options.timeout {
            balloon.set_timeout(MESSAGE_TIMEOUT);
        }
        balloon.set_content(host, Some(Box::new(content)))?;
        Ok(balloon)
    }

    pub fn show_at_point(
        host: &mut dyn Host,
        measure: &dyn TextMeasure,
        content: MessageContent,
        options: MessageBalloonOptions,
        point: Point,
    ) -> Result<BalloonWindow> {
        let screen = monitor_for_point(&*host, point);
        let mut balloon = Self::create(host, measure, content, options, screen)?;
        balloon.show_at_point(host, point)?;
        Ok(balloon)
    }

    pub fn show_at_element(
        host: &mut dyn Host,
        measure: &dyn TextMeasure,
        content: MessageContent,
        options: MessageBalloonOptions,
        element: ElementId,
    ) -> Result<BalloonWindow> {
        let screen = match host.element(element) {
            Some(info) => host.monitor_bounds(info.screen_bounds),
            None => host.monitor_bounds(Rect::new(0, 0, 1, 1)),
        };
        let mut balloon = Self::create(host, measure, content, options, screen)?;
        balloon.show_at_element(host, element)?;
        Ok(balloon)
    }
}
