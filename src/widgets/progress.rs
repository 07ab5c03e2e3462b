use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::primitives::fill_rect;
use crate::style::{Style, StyleKey};

/// Horizontal bar filled in proportion to `value` within `min..=max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressBar {
    min: f32,
    max: f32,
    value: f32,
}

impl ProgressBar {
    /// Bar over `min..=max` starting empty. Reversed bounds are swapped.
    pub const fn new(
        min: f32,
        max: f32,
    ) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, value: min }
    }

    #[inline]
    pub const fn value(&self) -> f32 { self.value }

    /// Set the value, clamped into range. NaN is ignored.
    pub const fn set_value(
        &mut self,
        value: f32,
    ) {
        if !value.is_nan() {
            self.value = value.clamp(self.min, self.max);
        }
    }

    /// Filled share of the bar in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 { 0.0 } else { (self.value - self.min) / span }
    }

    pub fn draw<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        style: &Style,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let filled = (area.size.width as f32 * self.fraction()).round() as u32;
        if filled > 0 {
            let bar = Rectangle::new(area.top_left, Size::new(filled.min(area.size.width), area.size.height));
            fill_rect(display, bar, style.color(StyleKey::BackgroundSelect));
        }
    }
}

impl Default for ProgressBar {
    fn default() -> Self { Self::new(0.0, 100.0) }
}
