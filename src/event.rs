//! Platform-neutral input events and the trigger kinds callbacks bind to.
//!
//! Platforms translate their native events (SDL, touch controller, GPIO buttons)
//! into [`Event`] before handing them to the
//! [`Application`](crate::app::Application). Pointer positions are in screen
//! coordinates on entry; the dispatcher rewrites them into widget-local coordinates
//! before any callback sees them.

use core::fmt;

use embedded_graphics::geometry::Point;

/// Mouse (or touch) button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button. Touch contacts map here.
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

impl MouseButton {
    #[inline]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Left)
    }

    #[inline]
    pub const fn is_wheel(self) -> bool {
        matches!(self, Self::WheelUp | Self::WheelDown)
    }
}

/// Keys the toolkit understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Tab,
    Backspace,
    Space,
    Char(char),
}

/// An input or synthesized event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Motion { pos: Point },
    ButtonDown { pos: Point, button: MouseButton },
    ButtonUp { pos: Point, button: MouseButton },
    /// Synthesized on release of a button that also received the press.
    Click { pos: Point },
    /// Synthesized on the second primary press inside the double-click window.
    DoubleClick { pos: Point },
    KeyDown { key: Key },
    KeyUp { key: Key },
    /// Synthesized when a widget joins the hover chain.
    Enter,
    /// Synthesized when a widget leaves the hover chain.
    Leave,
    GainFocus,
    LoseFocus,
    Quit,
}

impl Event {
    /// Pointer position carried by the event, if any.
    pub const fn pos(&self) -> Option<Point> {
        match *self {
            Self::Motion { pos }
            | Self::ButtonDown { pos, .. }
            | Self::ButtonUp { pos, .. }
            | Self::Click { pos }
            | Self::DoubleClick { pos } => Some(pos),
            _ => None,
        }
    }

    /// Same event with its pointer position replaced.
    #[must_use]
    pub const fn with_pos(
        self,
        new: Point,
    ) -> Self {
        match self {
            Self::Motion { .. } => Self::Motion { pos: new },
            Self::ButtonDown { button, .. } => Self::ButtonDown { pos: new, button },
            Self::ButtonUp { button, .. } => Self::ButtonUp { pos: new, button },
            Self::Click { .. } => Self::Click { pos: new },
            Self::DoubleClick { .. } => Self::DoubleClick { pos: new },
            other => other,
        }
    }

    #[inline]
    pub const fn is_key(&self) -> bool { matches!(self, Self::KeyDown { .. } | Self::KeyUp { .. }) }

    #[inline]
    pub const fn is_pointer(&self) -> bool { self.pos().is_some() }

    /// Trigger a binding must be registered under to receive this event.
    pub const fn trigger(&self) -> Trigger {
        match *self {
            Self::Motion { .. } => Trigger::Motion,
            Self::ButtonDown { button, .. } => Trigger::ButtonDown(button),
            Self::ButtonUp { button, .. } => Trigger::ButtonUp(button),
            Self::Click { .. } => Trigger::Click,
            Self::DoubleClick { .. } => Trigger::DoubleClick,
            Self::KeyDown { key } => Trigger::KeyDown(key),
            Self::KeyUp { key } => Trigger::KeyUp(key),
            Self::Enter => Trigger::Enter,
            Self::Leave => Trigger::Leave,
            Self::GainFocus => Trigger::GainFocus,
            Self::LoseFocus => Trigger::LoseFocus,
            Self::Quit => Trigger::Quit,
        }
    }
}

/// Event kind (with its button or key qualifier) a callback is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    Motion,
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Click,
    DoubleClick,
    KeyDown(Key),
    KeyUp(Key),
    Enter,
    Leave,
    GainFocus,
    LoseFocus,
    Quit,
}

impl fmt::Display for Trigger {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
