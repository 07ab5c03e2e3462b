//! Color constants for the toolkit theme.
//!
//! Rgb565 uses 16 bits per pixel: 5 bits red (0-31), 6 bits green (0-63) and
//! 5 bits blue (0-31). Primary colors come from the `RgbColor` trait constants;
//! theme shades are given directly in 565 space.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

// =============================================================================
// Standard Colors
// =============================================================================

/// Pure black. Default background.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white. Default text and bright background.
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red. Used for alerts and graph lines over limits.
pub const RED: Rgb565 = Rgb565::RED;

/// Pure green. Used for progress bars and "ok" indicators.
pub const GREEN: Rgb565 = Rgb565::GREEN;

/// Pure yellow. Used for warnings.
pub const YELLOW: Rgb565 = Rgb565::YELLOW;

/// Orange accent. RGB565: (31, 32, 0).
pub const ORANGE: Rgb565 = Rgb565::new(31, 32, 0);

// =============================================================================
// Theme Shades
// =============================================================================

/// Disabled text. RGB888 (128, 128, 128).
pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Default border. RGB888 (50, 50, 50).
pub const DARK_GRAY: Rgb565 = Rgb565::new(6, 12, 6);

/// Light beige panel background. RGB888 (233, 231, 227).
pub const BEIGE: Rgb565 = Rgb565::new(29, 57, 28);

/// Inactive title text. RGB888 (212, 208, 200).
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(26, 52, 25);

/// Selection highlight and active title bar. RGB888 (10, 36, 106).
pub const NAVY: Rgb565 = Rgb565::new(1, 9, 13);

/// Marker color treated as transparent by image widgets. RGB888 (255, 0, 128).
pub const TRANSPARENT_KEY: Rgb565 = Rgb565::new(31, 0, 16);
