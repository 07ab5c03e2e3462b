//! Visual attribute tables shared by widgets.
//!
//! A [`Style`] maps every [`StyleKey`] to a [`StyleValue`]. The key set is closed and
//! each key has a fixed value type, so a table built through [`Style::derive`] can
//! never hold a font where a color is expected. Widgets resolve their style once at
//! construction: [`DEFAULT_STYLE`], then the defaults for their kind
//! ([`kind_defaults`]), then caller overrides. The result is shared behind an `Rc`
//! and never mutated afterwards.
//!
//! # Border Kinds
//!
//! | Kind | Width | Look |
//! |------|-------|------|
//! | `None` | 0 | nothing |
//! | `Flat` | 1 | single line in the border color |
//! | `SimpleSunken` / `SimpleRaised` | 1 | two-tone bevel |
//! | `Sunken` / `Raised` | 2 | four-tone bevel |
//! | `SunkenFlat` / `RaisedFlat` | 1 | single line in the bevel's highlight color |

use core::fmt;

use embedded_graphics::mono_font::{
    MonoFont,
    ascii::{FONT_6X10, FONT_6X13_BOLD},
};
use embedded_graphics::pixelcolor::Rgb565;

use crate::colors::{BEIGE, BLACK, DARK_GRAY, GRAY, LIGHT_GRAY, NAVY, TRANSPARENT_KEY, WHITE};
use crate::error::UiError;

// =============================================================================
// Keys and Values
// =============================================================================

/// Every attribute a style table carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKey {
    TextColor,
    TextDisabled,
    TextSelected,
    TextTitle,
    TextTitleInactive,
    Font,
    TitleFont,
    Border,
    BorderDown,
    /// Border used while hovered. `None` keeps the normal border.
    BorderHover,
    BorderColor,
    BorderShadow,
    BorderHighlight,
    BorderHighlightShadow,
    /// Outline drawn around the focused widget. `None` draws nothing.
    BorderActive,
    Background,
    BackgroundBright,
    BackgroundLight,
    BackgroundSelect,
    BackgroundTitle,
    BackgroundTitleInactive,
    Transparent,
}

impl StyleKey {
    /// Number of keys, and the length of every style table.
    pub const COUNT: usize = 22;

    /// Value type every table entry for this key must have.
    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Font | Self::TitleFont => ValueType::Font,
            Self::Border | Self::BorderDown => ValueType::Border,
            Self::BorderHover => ValueType::OptionalBorder,
            Self::BorderActive => ValueType::OptionalColor,
            _ => ValueType::Color,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Type tag of a [`StyleValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Color,
    OptionalColor,
    Font,
    Border,
    OptionalBorder,
}

/// How a widget edge is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BorderKind {
    None,
    Sunken,
    SunkenFlat,
    Raised,
    RaisedFlat,
    SimpleSunken,
    SimpleRaised,
    #[default]
    Flat,
}

impl BorderKind {
    /// Pixels the border occupies on each side of the widget.
    pub const fn width(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Sunken | Self::Raised => 2,
            _ => 1,
        }
    }
}

/// Reference to a static monospace font.
///
/// Fonts compare by identity: two references are equal when they point at the
/// same font table.
#[derive(Clone, Copy)]
pub struct FontRef(pub &'static MonoFont<'static>);

impl PartialEq for FontRef {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        core::ptr::eq(self.0, other.0)
    }
}

impl fmt::Debug for FontRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let size = self.0.character_size;
        write!(f, "FontRef({}x{})", size.width, size.height)
    }
}

/// Tagged value stored under a [`StyleKey`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StyleValue {
    Color(Rgb565),
    OptionalColor(Option<Rgb565>),
    Font(FontRef),
    Border(BorderKind),
    OptionalBorder(Option<BorderKind>),
}

impl StyleValue {
    /// Shorthand for a font value.
    pub const fn font(font: &'static MonoFont<'static>) -> Self {
        Self::Font(FontRef(font))
    }

    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Color(_) => ValueType::Color,
            Self::OptionalColor(_) => ValueType::OptionalColor,
            Self::Font(_) => ValueType::Font,
            Self::Border(_) => ValueType::Border,
            Self::OptionalBorder(_) => ValueType::OptionalBorder,
        }
    }

    /// Convert to the type `expected`, lifting plain values into optional slots.
    fn coerce(
        self,
        expected: ValueType,
    ) -> Option<Self> {
        match (self, expected) {
            (value, expected) if value.value_type() == expected => Some(value),
            (Self::Color(c), ValueType::OptionalColor) => Some(Self::OptionalColor(Some(c))),
            (Self::Border(b), ValueType::OptionalBorder) => Some(Self::OptionalBorder(Some(b))),
            _ => None,
        }
    }
}

// =============================================================================
// Style Table
// =============================================================================

/// Resolved attribute table for one widget (or a family of widgets sharing it).
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    values: [StyleValue; StyleKey::COUNT],
}

/// Theme every widget style starts from.
pub const DEFAULT_STYLE: Style = Style {
    values: [
        StyleValue::Color(WHITE),                   // TextColor
        StyleValue::Color(GRAY),                    // TextDisabled
        StyleValue::Color(WHITE),                   // TextSelected
        StyleValue::Color(WHITE),                   // TextTitle
        StyleValue::Color(LIGHT_GRAY),              // TextTitleInactive
        StyleValue::font(&FONT_6X10),               // Font
        StyleValue::font(&FONT_6X13_BOLD),          // TitleFont
        StyleValue::Border(BorderKind::Flat),       // Border
        StyleValue::Border(BorderKind::Flat),       // BorderDown
        StyleValue::OptionalBorder(None),           // BorderHover
        StyleValue::Color(DARK_GRAY),               // BorderColor
        StyleValue::Color(DARK_GRAY),               // BorderShadow
        StyleValue::Color(DARK_GRAY),               // BorderHighlight
        StyleValue::Color(DARK_GRAY),               // BorderHighlightShadow
        StyleValue::OptionalColor(Some(BLACK)),     // BorderActive
        StyleValue::Color(BLACK),                   // Background
        StyleValue::Color(WHITE),                   // BackgroundBright
        StyleValue::Color(BEIGE),                   // BackgroundLight
        StyleValue::Color(NAVY),                    // BackgroundSelect
        StyleValue::Color(NAVY),                    // BackgroundTitle
        StyleValue::Color(DARK_GRAY),               // BackgroundTitleInactive
        StyleValue::Color(TRANSPARENT_KEY),         // Transparent
    ],
};

impl Style {
    /// Raw value stored under `key`.
    #[inline]
    pub const fn get(
        &self,
        key: StyleKey,
    ) -> StyleValue {
        self.values[key.index()]
    }

    /// Color stored under `key`. Empty optional slots read as the default background.
    pub const fn color(
        &self,
        key: StyleKey,
    ) -> Rgb565 {
        match self.get(key) {
            StyleValue::Color(c) | StyleValue::OptionalColor(Some(c)) => c,
            _ => BLACK,
        }
    }

    pub const fn optional_color(
        &self,
        key: StyleKey,
    ) -> Option<Rgb565> {
        match self.get(key) {
            StyleValue::Color(c) => Some(c),
            StyleValue::OptionalColor(c) => c,
            _ => None,
        }
    }

    pub fn font(
        &self,
        key: StyleKey,
    ) -> &'static MonoFont<'static> {
        match self.get(key) {
            StyleValue::Font(FontRef(font)) => font,
            _ => &FONT_6X10,
        }
    }

    pub const fn border(
        &self,
        key: StyleKey,
    ) -> BorderKind {
        match self.get(key) {
            StyleValue::Border(b) | StyleValue::OptionalBorder(Some(b)) => b,
            _ => BorderKind::None,
        }
    }

    pub const fn optional_border(
        &self,
        key: StyleKey,
    ) -> Option<BorderKind> {
        match self.get(key) {
            StyleValue::Border(b) => Some(b),
            StyleValue::OptionalBorder(b) => b,
            _ => None,
        }
    }

    /// Copy this table with `overrides` applied on top.
    ///
    /// Fails with [`UiError::StyleTypeMismatch`] if an override's value type does not
    /// match its key. Plain colors and borders are accepted for optional slots.
    pub fn derive(
        &self,
        overrides: &[(StyleKey, StyleValue)],
    ) -> Result<Self, UiError> {
        let mut style = self.clone();
        for &(key, value) in overrides {
            let value = value
                .coerce(key.value_type())
                .ok_or(UiError::StyleTypeMismatch { key })?;
            style.values[key.index()] = value;
        }
        Ok(style)
    }
}

impl Default for Style {
    fn default() -> Self { DEFAULT_STYLE }
}

// =============================================================================
// Per-Kind Defaults
// =============================================================================

/// Style family a widget kind draws its defaults from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleClass {
    Plain,
    Button,
    ScrollButton,
    Scrollbar,
    Window,
    Popup,
    PopupItem,
}

const BUTTON_DEFAULTS: &[(StyleKey, StyleValue)] = &[
    (StyleKey::Border, StyleValue::Border(BorderKind::Flat)),
    (StyleKey::BorderDown, StyleValue::Border(BorderKind::SimpleSunken)),
    (StyleKey::BorderHover, StyleValue::OptionalBorder(Some(BorderKind::SimpleRaised))),
    (StyleKey::BorderHighlight, StyleValue::Color(LIGHT_GRAY)),
];

const SCROLL_BUTTON_DEFAULTS: &[(StyleKey, StyleValue)] = &[
    (StyleKey::Border, StyleValue::Border(BorderKind::Flat)),
    (StyleKey::BorderDown, StyleValue::Border(BorderKind::SimpleSunken)),
    (StyleKey::BorderHighlight, StyleValue::Color(LIGHT_GRAY)),
];

const SCROLLBAR_DEFAULTS: &[(StyleKey, StyleValue)] = &[(StyleKey::Border, StyleValue::Border(BorderKind::None))];

const WINDOW_DEFAULTS: &[(StyleKey, StyleValue)] = &[(StyleKey::Border, StyleValue::Border(BorderKind::Raised))];

const POPUP_DEFAULTS: &[(StyleKey, StyleValue)] = &[
    (StyleKey::Border, StyleValue::Border(BorderKind::Flat)),
    (StyleKey::BorderColor, StyleValue::Color(GRAY)),
];

const POPUP_ITEM_DEFAULTS: &[(StyleKey, StyleValue)] = &[(StyleKey::Border, StyleValue::Border(BorderKind::None))];

/// Overrides applied between [`DEFAULT_STYLE`] and caller overrides for `class`.
pub const fn kind_defaults(class: StyleClass) -> &'static [(StyleKey, StyleValue)] {
    match class {
        StyleClass::Plain => &[],
        StyleClass::Button => BUTTON_DEFAULTS,
        StyleClass::ScrollButton => SCROLL_BUTTON_DEFAULTS,
        StyleClass::Scrollbar => SCROLLBAR_DEFAULTS,
        StyleClass::Window => WINDOW_DEFAULTS,
        StyleClass::Popup => POPUP_DEFAULTS,
        StyleClass::PopupItem => POPUP_ITEM_DEFAULTS,
    }
}

/// Resolve the style for a widget of `class` with caller `overrides`.
pub fn resolve(
    class: StyleClass,
    overrides: &[(StyleKey, StyleValue)],
) -> Result<Style, UiError> {
    DEFAULT_STYLE.derive(kind_defaults(class))?.derive(overrides)
}
