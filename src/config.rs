//! Toolkit configuration: compile-time constants and host-supplied startup settings.
//!
//! Layout and timing values that never change at runtime are `const`, so widget code
//! references them directly instead of threading them through constructors. The few
//! values a host may override at startup (display geometry, fullscreen, pointer
//! visibility, frame cadence) live in [`AppConfig`], which is read once when the
//! [`Application`](crate::app::Application) is created.

use std::time::Duration;

use embedded_graphics::geometry::Size;

// =============================================================================
// Display Configuration
// =============================================================================

/// Default display width in pixels (320x240 TFT panel).
pub const SCREEN_WIDTH: u32 = 320;

/// Default display height in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

// =============================================================================
// Timing Configuration
// =============================================================================

/// Target frame rate of the UI loop.
pub const FRAME_RATE: u32 = 30;

/// Target frame time derived from [`FRAME_RATE`]. The loop sleeps if a frame completes early.
pub const FRAME_TIME: Duration = Duration::from_micros(1_000_000 / FRAME_RATE as u64);

/// Maximum spacing between two primary presses that still counts as a double click.
pub const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(400);

/// Delay before a held scrollbar button starts repeating.
pub const SCROLL_REPEAT_DELAY: Duration = Duration::from_millis(400);

/// Interval between repeats once a held scrollbar button is repeating.
pub const SCROLL_REPEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Hover time over a sub-popup item before its popup opens.
pub const SUB_POPUP_DELAY: Duration = Duration::from_millis(200);

/// How long the host waits for background workers when shutting down.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Widget Geometry
// =============================================================================

/// Height of a window title bar.
pub const TITLE_HEIGHT: u32 = 21;

/// Edge length of a title bar decoration button.
pub const DECORATION_SIZE: u32 = 12;

/// Horizontal pitch between decoration buttons, measured from the right edge.
pub const DECORATION_PITCH: i32 = 18;

/// Width of a popup menu.
pub const POPUP_WIDTH: u32 = 100;

/// Height of a popup menu item.
pub const POPUP_ITEM_HEIGHT: u32 = 20;

/// Height of a popup separator.
pub const POPUP_SEPARATOR_HEIGHT: u32 = 10;

/// Offset between the requested anchor and the popup's top-left corner.
pub const POPUP_ANCHOR_OFFSET: i32 = 2;

/// Thickness of a scrollbar (height when horizontal, width when vertical).
pub const SCROLLBAR_THICKNESS: u32 = 16;

/// Length reserved at each end of a scrollbar track for its step buttons.
pub const SCROLLBAR_END: i32 = 18;

/// Fraction of the content stepped per scrollbar button press.
pub const SCROLL_STEP: f32 = 0.01;

/// Fraction of the content stepped per mouse wheel notch.
pub const WHEEL_STEP: f32 = 0.05;

/// Margin added past the furthest child when a container grows its content size.
pub const CONTENT_MARGIN: u32 = 4;

// =============================================================================
// Background Fetch Configuration
// =============================================================================

/// Pause between successful fetch iterations.
pub const FETCH_PERIOD: Duration = Duration::from_millis(100);

/// Consecutive transient failures tolerated before the worker gives up.
pub const FETCH_RETRIES: u32 = 5;

/// Pause after a transient fetch failure.
pub const FETCH_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Lifetime of an unconsumed command request in the store.
pub const REQUEST_TTL: Duration = Duration::from_secs(5);

// =============================================================================
// Startup Configuration
// =============================================================================

/// Settings the host supplies once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Display geometry in pixels.
    pub screen: Size,
    /// Run without window chrome. Enables the Escape-to-exit root binding.
    pub fullscreen: bool,
    /// Whether the platform should draw a pointer (touch panels hide it).
    pub show_pointer: bool,
    /// Target frame time.
    pub frame_time: Duration,
    /// Double-click window.
    pub double_click: Duration,
    /// Join timeout used by [`Application::shutdown`](crate::app::Application::shutdown).
    pub join_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            screen: Size::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            fullscreen: false,
            show_pointer: true,
            frame_time: FRAME_TIME,
            double_click: DOUBLE_CLICK_TIME,
            join_timeout: JOIN_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_matches_rate() {
        assert_eq!(FRAME_TIME, Duration::from_micros(33_333));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.screen, Size::new(320, 240));
        assert_eq!(config.double_click, Duration::from_millis(400));
        assert!(!config.fullscreen);
    }
}
