use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;

use super::Look;
use super::primitives::draw_text_block;
use crate::style::{Style, StyleKey};
use crate::text::{Align, Wrap};

/// Text display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub wrap: Wrap,
    pub align: Align,
}

impl Label {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_owned(), ..Self::default() }
    }

    #[must_use]
    pub const fn wrap(
        mut self,
        wrap: Wrap,
    ) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub const fn align(
        mut self,
        align: Align,
    ) -> Self {
        self.align = align;
        self
    }

    pub fn draw<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        style: &Style,
        look: Look,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let font = style.font(StyleKey::Font);
        draw_text_block(display, area, &self.text, self.wrap, self.align, font, look.text_color(style));
    }
}
