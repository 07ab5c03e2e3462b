//! Leaf widget kinds and the drawing code they share.
//!
//! - [`label`]: static or data-driven text with wrap mode and alignment
//! - [`button`]: press/release buttons, including window decorations
//! - [`image`]: pictures from the application's [`ImageStore`](crate::assets::ImageStore)
//! - [`progress`]: horizontal bar for a value within a range
//! - [`graph`]: scrolling sample history with automatic y range
//! - [`primitives`]: borders, icons, text blocks and sparklines
//!
//! # Drawing Contract
//!
//! The renderer paints each widget's background and border from its [`Style`]
//! and then asks the kind to fill the area inside the border. Kinds never draw
//! outside the rect they are given; the renderer clips them to their container's
//! view regardless.
//!
//! [`Style`]: crate::style::Style

mod button;
mod graph;
mod image;
mod label;
mod progress;
pub mod primitives;

use embedded_graphics::pixelcolor::Rgb565;

pub use button::{Button, ButtonRole};
pub use graph::{GRAPH_HISTORY_SIZE, Graph};
pub use image::ImageView;
pub use label::Label;
pub use progress::ProgressBar;

use crate::style::{BorderKind, Style, StyleKey};

/// Interaction state a widget is drawn in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Look {
    pub disabled: bool,
    pub hovered: bool,
    pub pressed: bool,
    pub selected: bool,
}

impl Look {
    /// Border for the current state: pressed, then hovered, then normal.
    pub const fn border(
        self,
        style: &Style,
    ) -> BorderKind {
        if self.disabled {
            return style.border(StyleKey::Border);
        }
        if self.pressed {
            return style.border(StyleKey::BorderDown);
        }
        if self.hovered
            && let Some(border) = style.optional_border(StyleKey::BorderHover)
        {
            return border;
        }
        style.border(StyleKey::Border)
    }

    pub const fn text_color(
        self,
        style: &Style,
    ) -> Rgb565 {
        if self.disabled {
            style.color(StyleKey::TextDisabled)
        } else if self.selected {
            style.color(StyleKey::TextSelected)
        } else {
            style.color(StyleKey::TextColor)
        }
    }

    pub const fn background(
        self,
        style: &Style,
    ) -> Rgb565 {
        if self.selected && !self.disabled {
            style.color(StyleKey::BackgroundSelect)
        } else {
            style.color(StyleKey::Background)
        }
    }
}
