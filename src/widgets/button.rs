use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;

use super::Look;
use super::primitives::{draw_cross, draw_text_block};
use crate::style::{Style, StyleKey};
use crate::text::{Align, Wrap};

/// What a button does besides running its `Click` bindings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ButtonRole {
    #[default]
    Command,
    /// Window close decoration: destroys its window after the bindings ran.
    Close,
    /// Window help decoration.
    Help,
}

/// Push button. `Click` fires when the primary button is released over the
/// widget that received the press.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub role: ButtonRole,
    /// Take keyboard focus within the window when pressed.
    pub steal_focus: bool,
}

impl Button {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_owned(), ..Self::default() }
    }

    pub fn with_role(
        text: &str,
        role: ButtonRole,
    ) -> Self {
        Self { role, ..Self::new(text) }
    }

    #[must_use]
    pub const fn steal_focus(
        mut self,
        steal: bool,
    ) -> Self {
        self.steal_focus = steal;
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
        let color = look.text_color(style);
        match self.role {
            ButtonRole::Close => draw_cross(display, area, color),
            ButtonRole::Help => {
                draw_text_block(display, area, "?", Wrap::Clip, Align::Center, style.font(StyleKey::Font), color);
            }
            ButtonRole::Command => {
                let font = style.font(StyleKey::Font);
                draw_text_block(display, area, &self.text, Wrap::Ellipsis, Align::Center, font, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::prelude::*;

    use super::*;
    use crate::colors::WHITE;
    use crate::style::DEFAULT_STYLE;

    #[test]
    fn test_constructors() {
        let button = Button::new("OK");
        assert_eq!(button.role, ButtonRole::Command);
        assert!(!button.steal_focus);

        let close = Button::with_role("", ButtonRole::Close).steal_focus(true);
        assert_eq!(close.role, ButtonRole::Close);
        assert!(close.steal_focus);
    }

    #[test]
    fn test_close_role_draws_cross() {
        let mut display = MockDisplay::<Rgb565>::new();
        let area = Rectangle::new(Point::zero(), Size::new(10, 10));
        Button::with_role("ignored", ButtonRole::Close).draw(&mut display, area, &DEFAULT_STYLE, Look::default());
        assert_eq!(display.get_pixel(Point::new(2, 2)), Some(WHITE));
        assert_eq!(display.get_pixel(Point::new(7, 2)), Some(WHITE));
        assert_eq!(display.get_pixel(Point::new(0, 0)), None, "2px margin");
    }

    #[test]
    fn test_command_text_is_centered() {
        let mut display = MockDisplay::<Rgb565>::new();
        let area = Rectangle::new(Point::zero(), Size::new(40, 20));
        Button::new("Go").draw(&mut display, area, &DEFAULT_STYLE, Look::default());
        let drawn = display.affected_area();
        let left_gap = drawn.top_left.x;
        let right_gap = 40 - (drawn.top_left.x + drawn.size.width as i32);
        assert!((left_gap - right_gap).abs() <= 3, "gaps {left_gap} / {right_gap}");
    }
}
