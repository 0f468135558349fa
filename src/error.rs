use std::fmt;

use thiserror::Error;

use crate::layout::LayoutError;

/// Failures surfaced by balloon operations. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalloonError {
    #[error("invalid argument `{param}`: {message}")]
    InvalidArgument { param: &'static str, message: String },
    #[error("invalid state: {message}")]
    InvalidState { message: String },
    #[error("target {element} is not visible: {message}")]
    TargetNotVisible { element: String, message: String },
    #[error("composition failed: {message}")]
    Composition { message: String },
    #[error("host error: {message}")]
    Host { message: String },
}

pub type Result<T> = std::result::Result<T, BalloonError>;

/// Identifies a user-facing error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    EmptyRectangle,
    OffsetOutOfRange,
    ZeroCornerRadius,
    NegativeMargin,
    AutoBaseQuadrant,
    AutoBaseOffset,
    AnchorLocked,
    PointOffScreen,
    TargetInvisible,
    TargetOffScreen,
    TargetClipped,
    PixelFormat,
    MissingOutline,
    EmptyBounds,
}

/// Formats error text. Balloons receive one at construction so callers can
/// localise messages without any process-wide lookup table.
pub trait ErrorMessages: fmt::Debug {
    fn message(&self, key: ErrorKey, detail: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorMessages;

impl ErrorMessages for DefaultErrorMessages {
    fn message(&self, key: ErrorKey, detail: &str) -> String {
        let text = match key {
            ErrorKey::EmptyRectangle => "the target rectangle is empty",
            ErrorKey::OffsetOutOfRange => "the anchor offset must not be negative",
            ErrorKey::ZeroCornerRadius => "the corner radius must be greater than zero",
            ErrorKey::NegativeMargin => "the anchor margin must not be negative",
            ErrorKey::AutoBaseQuadrant => "the base quadrant cannot be Auto",
            ErrorKey::AutoBaseOffset => "the base offset must be a fixed value",
            ErrorKey::AnchorLocked => "the anchor is locked to a tracked target",
            ErrorKey::PointOffScreen => "the point is not on any visible screen",
            ErrorKey::TargetInvisible => "the target element must be visible",
            ErrorKey::TargetOffScreen => "the target element is not on a visible part of the screen",
            ErrorKey::TargetClipped => "the target element is hidden by its containers",
            ErrorKey::PixelFormat => "the bitmap must be 32bpp with an alpha channel",
            ErrorKey::MissingOutline => "no outline is available for the window",
            ErrorKey::EmptyBounds => "the layout bounds have no area",
        };
        if detail.is_empty() {
            text.to_string()
        } else {
            format!("{text} ({detail})")
        }
    }
}

impl BalloonError {
    pub fn invalid_argument(
        messages: &dyn ErrorMessages,
        param: &'static str,
        key: ErrorKey,
        detail: impl fmt::Display,
    ) -> Self {
        BalloonError::InvalidArgument {
            param,
            message: messages.message(key, &detail.to_string()),
        }
    }

    pub fn invalid_state(messages: &dyn ErrorMessages, key: ErrorKey, detail: impl fmt::Display) -> Self {
        BalloonError::InvalidState {
            message: messages.message(key, &detail.to_string()),
        }
    }

    pub fn target_not_visible(
        messages: &dyn ErrorMessages,
        element: impl fmt::Display,
        key: ErrorKey,
    ) -> Self {
        BalloonError::TargetNotVisible {
            element: element.to_string(),
            message: messages.message(key, ""),
        }
    }

    pub fn composition(messages: &dyn ErrorMessages, key: ErrorKey, detail: impl fmt::Display) -> Self {
        BalloonError::Composition {
            message: messages.message(key, &detail.to_string()),
        }
    }

    pub fn from_layout(messages: &dyn ErrorMessages, err: LayoutError) -> Self {
        let (param, key) = match err {
            LayoutError::EmptyBounds(_) => ("bounds", ErrorKey::EmptyBounds),
            LayoutError::CornerRadius(_) => ("corner_radius", ErrorKey::ZeroCornerRadius),
            LayoutError::NegativeMargin(_) => ("anchor_margin", ErrorKey::NegativeMargin),
            LayoutError::NegativeOffset(_) => ("anchor_offset", ErrorKey::OffsetOutOfRange),
        };
        BalloonError::invalid_argument(messages, param, key, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Terse;

    impl ErrorMessages for Terse {
        fn message(&self, key: ErrorKey, _detail: &str) -> String {
            format!("{key:?}")
        }
    }

    #[test]
    fn injected_formatter_supplies_the_message() {
        let err = BalloonError::invalid_argument(&Terse, "rect", ErrorKey::EmptyRectangle, "");
        assert_eq!(
            err,
            BalloonError::InvalidArgument {
                param: "rect",
                message: "EmptyRectangle".into()
            }
        );
    }

    #[test]
    fn layout_errors_become_invalid_arguments() {
        let err = BalloonError::from_layout(&DefaultErrorMessages, LayoutError::CornerRadius(0));
        match err {
            BalloonError::InvalidArgument { param, message } => {
                assert_eq!(param, "corner_radius");
                assert!(message.contains("greater than zero"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
