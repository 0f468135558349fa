//! Anchored balloon pop-ups: rounded callout windows whose tip points at a
//! screen point, a rectangle or a tracked on-screen element, with an optional
//! soft drop shadow.

pub mod balloon;
pub mod error;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod logging;
pub mod message;
pub mod outline;
pub mod placement;
pub mod region;
pub mod render;
pub mod settings;
pub mod shadow;
pub mod surface;
pub mod tracking;
#[cfg(windows)]
pub mod win32;

pub use balloon::{AnchorTarget, BalloonContent, BalloonState, BalloonWindow};
pub use error::{BalloonError, DefaultErrorMessages, ErrorKey, ErrorMessages, Result};
pub use geometry::{Point, Rect, Size};
pub use host::{ElementId, Host, HostEvent};
pub use layout::{AnchorOffset, AnchorQuadrant, Quadrant};
pub use message::{MessageBalloon, MessageBalloonOptions, MessageContent, TextMeasure};
pub use settings::BalloonSettings;
