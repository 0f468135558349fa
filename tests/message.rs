use balloon_window::geometry::{Point, Rect, Size};
use balloon_window::host::WindowKind;
use balloon_window::message::MESSAGE_TIMEOUT;
use balloon_window::{BalloonState, MessageBalloon, MessageBalloonOptions, MessageContent, TextMeasure};

#[path = "mock_host.rs"]
mod mock_host;
use mock_host::MockHost;

/// Seven pixels per character, fifteen per line.
struct Monospace;

impl TextMeasure for Monospace {
    fn measure(&self, text: &str, max_width: Option<i32>, _bold: bool) -> Size {
        let width = text.chars().count() as i32 * 7;
        match max_width {
            Some(max) if max > 0 => {
                let lines = (width + max - 1) / max;
                Size::new(width.min(max), lines.max(1) * 15)
            }
            _ => Size::new(width, 15),
        }
    }
}

#[test]
fn message_balloon_is_sized_for_its_text() {
    let mut host = MockHost::new();
    let content = MessageContent::new("Saved", "All changes written");
    let balloon = MessageBalloon::show_at_point(
        &mut host,
        &Monospace,
        content,
        MessageBalloonOptions::default(),
        Point::new(800, 500),
    )
    .unwrap();

    assert_eq!(balloon.size(), Size::new(172, 160));
    assert_eq!(balloon.anchor_point(), Point::new(800, 500));
    assert_eq!(balloon.state(), BalloonState::VisibleUnanchored);

    let window = host.window(balloon.window().unwrap());
    assert_eq!(window.last_text.len(), 2);
    assert_eq!(window.last_text[0].text, "Saved");
    assert!(window.last_text[0].bold);
    assert_eq!(window.last_text[0].bounds, Rect::new(34, 29, 112, 15));
    assert_eq!(window.last_text[1].text, "All changes written");
    assert_eq!(window.last_text[1].bounds, Rect::new(12, 49, 134, 85));
}

#[test]
fn options_control_shadow_and_timeout() {
    let mut host = MockHost::new();
    let options = MessageBalloonOptions {
        show_shadow: false,
        timeout: true,
        ..MessageBalloonOptions::default()
    };
    let mut balloon = MessageBalloon::show_at_point(
        &mut host,
        &Monospace,
        MessageContent::new("Heads up", "Disk almost full"),
        options,
        Point::new(400, 300),
    )
    .unwrap();

    assert!(host.windows_of(WindowKind::Shadow).is_empty());
    assert_eq!(balloon.timeout(), MESSAGE_TIMEOUT);

    host.advance(MESSAGE_TIMEOUT.as_millis() as u64);
    balloon.pump(&mut host).unwrap();
    assert!(!balloon.is_visible());
}

#[test]
fn message_balloon_tracks_an_element() {
    let mut host = MockHost::new();
    let field = host.add_element(Rect::new(300, 300, 120, 20), None);
    let balloon = MessageBalloon::show_at_element(
        &mut host,
        &Monospace,
        MessageContent::new("Invalid", "Enter a number"),
        MessageBalloonOptions::default(),
        field,
    )
    .unwrap();

    assert_eq!(balloon.state(), BalloonState::VisibleAnchoredTracking);
    assert_eq!(balloon.anchor_point(), Point::new(359, 309));
}

#[test]
fn fixed_scale_ignores_text_length() {
    let mut host = MockHost::new();
    let options = MessageBalloonOptions {
        horizontal_auto_scale: false,
        vertical_auto_scale: false,
        ..MessageBalloonOptions::default()
    };
    let balloon = MessageBalloon::create(
        &mut host,
        &Monospace,
        MessageContent::new("", &"long ".repeat(80)),
        options,
        mock_host::SCREEN,
    )
    .unwrap();

    assert_eq!(balloon.size(), Size::new(139, 160));
    assert!(!balloon.is_visible());
}
