//! Windows: titled, optionally modal containers stacked by the window manager.
//!
//! A window's rect is in screen coordinates and covers its title bar (when it has a
//! title). Children are laid out below the title bar. Close/Help decorations are
//! chrome buttons in the title bar, right-aligned.
//!
//! Windows are owned by the widget passed at creation (usually the root or another
//! window). Ownership drives modality ("descendant of the modal window") and the
//! fallback target when the active window is destroyed.

use std::ops::BitOr;

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::app::Application;
use crate::config::{DECORATION_PITCH, DECORATION_SIZE};
use crate::error::UiError;
use crate::event::Event;
use crate::style::{StyleClass, StyleKey, StyleValue};
use crate::widget::{WidgetId, WidgetKind};
use crate::widgets::{Button, ButtonRole};

/// Title bar buttons a window carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decorations {
    pub close: bool,
    pub help: bool,
}

impl Decorations {
    pub const NONE: Self = Self { close: false, help: false };
    pub const CLOSE: Self = Self { close: true, help: false };
    pub const HELP: Self = Self { close: false, help: true };
}

impl BitOr for Decorations {
    type Output = Self;

    fn bitor(
        self,
        rhs: Self,
    ) -> Self {
        Self {
            close: self.close || rhs.close,
            help: self.help || rhs.help,
        }
    }
}

/// One of the title bar buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoration {
    Close,
    Help,
}

/// Creation options for a window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: Option<String>,
    pub decorations: Decorations,
    pub modal: bool,
    /// Keep the window inside the screen while it is dragged.
    pub restrict_position: bool,
}

impl WindowOptions {
    pub fn titled(
        title: &str,
        decorations: Decorations,
    ) -> Self {
        Self {
            title: Some(title.into()),
            decorations,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    #[must_use]
    pub const fn restricted(mut self) -> Self {
        self.restrict_position = true;
        self
    }
}

/// Window state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowData {
    pub title: Option<String>,
    pub modal: bool,
    pub restrict_position: bool,
    /// Focused descendant receiving keyboard input.
    pub focus: Option<WidgetId>,
    pub(crate) close: Option<WidgetId>,
    pub(crate) help: Option<WidgetId>,
}

impl WindowData {
    pub fn new(options: &WindowOptions) -> Self {
        Self {
            title: options.title.clone(),
            modal: options.modal,
            restrict_position: options.restrict_position,
            focus: None,
            close: None,
            help: None,
        }
    }
}

impl Application {
    fn window_data(
        &self,
        id: WidgetId,
    ) -> Option<&WindowData> {
        match &self.tree.get(id)?.kind {
            WidgetKind::Window(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn window_data_mut(
        &mut self,
        id: WidgetId,
    ) -> Option<&mut WindowData> {
        match &mut self.tree.get_mut(id)?.kind {
            WidgetKind::Window(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn is_window(
        &self,
        id: WidgetId,
    ) -> bool {
        self.window_data(id).is_some()
    }

    /// Create a hidden window owned by `owner`. `rect` is in screen coordinates and
    /// includes the title bar.
    pub fn window(
        &mut self,
        owner: WidgetId,
        rect: Rectangle,
        options: &WindowOptions,
    ) -> Result<WidgetId, UiError> {
        self.window_styled(owner, rect, options, &[])
    }

    pub fn window_styled(
        &mut self,
        owner: WidgetId,
        rect: Rectangle,
        options: &WindowOptions,
        overrides: &[(StyleKey, StyleValue)],
    ) -> Result<WidgetId, UiError> {
        let window = self.create_styled(
            owner,
            rect,
            WidgetKind::Window(WindowData::new(options)),
            StyleClass::Window,
            overrides,
        )?;
        if let Some(node) = self.tree.get_mut(window) {
            node.visible = false;
        }

        if options.title.is_some() {
            let wanted = [
                (options.decorations.close, Decoration::Close),
                (options.decorations.help, Decoration::Help),
            ];
            let mut slot = 0;
            for (_, decoration) in wanted.into_iter().filter(|(on, _)| *on) {
                let x = rect.size.width as i32 - 4 - DECORATION_SIZE as i32 - DECORATION_PITCH * slot;
                let button_rect = Rectangle::new(Point::new(x, -17), Size::new(DECORATION_SIZE, DECORATION_SIZE));
                let role = match decoration {
                    Decoration::Close => ButtonRole::Close,
                    Decoration::Help => ButtonRole::Help,
                };
                let button = self.create_styled(
                    window,
                    button_rect,
                    WidgetKind::Button(Button::with_role("", role)),
                    StyleClass::Button,
                    &[],
                )?;
                if let Some(node) = self.tree.get_mut(button) {
                    node.chrome = true;
                }
                self.tree.pack(button)?;
                if let Some(data) = self.window_data_mut(window) {
                    match decoration {
                        Decoration::Close => data.close = Some(button),
                        Decoration::Help => data.help = Some(button),
                    }
                }
                slot += 1;
            }
        }
        Ok(window)
    }

    /// Title bar button of a window, for binding `Click` handlers.
    pub fn decoration(
        &self,
        window: WidgetId,
        decoration: Decoration,
    ) -> Option<WidgetId> {
        let data = self.window_data(window)?;
        match decoration {
            Decoration::Close => data.close,
            Decoration::Help => data.help,
        }
    }

    pub fn set_title(
        &mut self,
        window: WidgetId,
        title: &str,
    ) {
        if let Some(data) = self.window_data_mut(window)
            && data.title.is_some()
        {
            data.title = Some(title.into());
        }
    }

    /// Put a window on the stack (topmost) and optionally make it active.
    pub fn show_window(
        &mut self,
        window: WidgetId,
        activate: bool,
    ) -> Result<(), UiError> {
        let actual = self.tree.node(window)?.kind.name();
        if !self.is_window(window) {
            return Err(UiError::WrongKind { id: window, expected: "window", actual });
        }
        if let Some(node) = self.tree.get_mut(window) {
            node.visible = true;
        }
        if !self.wm.windows.contains(&window) {
            self.wm.windows.push(window);
            tracing::debug!(?window, depth = self.wm.windows.len(), "window shown");
        }
        if activate {
            self.set_active_window(Some(window));
        }
        self.refresh_hover();
        Ok(())
    }

    /// Take a window off the stack without destroying it.
    pub fn hide_window(
        &mut self,
        window: WidgetId,
    ) {
        if !self.wm.windows.contains(&window) {
            return;
        }
        let fallback = self.fallback_window(window);
        let subtree = self.tree.subtree(window);
        self.release_references(&subtree);
        for id in &subtree {
            if let Some(node) = self.tree.get_mut(*id)
                && node.kind.is_floating()
            {
                node.visible = false;
            }
        }
        if self.wm.active.is_none() && fallback.is_some() {
            self.set_active_window(fallback);
        }
        self.refresh_hover();
    }

    /// Window that takes over when `window` leaves the stack while active: the
    /// nearest owning window still on the stack.
    pub(crate) fn fallback_window(
        &self,
        window: WidgetId,
    ) -> Option<WidgetId> {
        self.tree
            .ancestors(window)
            .find(|ancestor| self.wm.windows.contains(ancestor))
    }

    /// Move a stacked window to the top without changing the active window.
    pub fn raise(
        &mut self,
        window: WidgetId,
    ) {
        if let Some(index) = self.wm.windows.iter().position(|&w| w == window) {
            let window = self.wm.windows.remove(index);
            self.wm.windows.push(window);
        }
    }

    /// Change the active window, raising it and sending focus events.
    pub fn set_active_window(
        &mut self,
        window: Option<WidgetId>,
    ) {
        if self.wm.active == window {
            if let Some(window) = window {
                self.raise(window);
            }
            return;
        }
        let previous = self.wm.active;
        self.wm.active = window;
        if let Some(window) = window {
            self.raise(window);
        }
        tracing::debug!(?previous, ?window, "active window changed");

        let root = self.root();
        if let Some(previous) = previous
            && self.tree.contains(previous)
        {
            self.run_bindings(previous, &Event::LoseFocus);
        } else if previous.is_none() {
            self.run_bindings(root, &Event::LoseFocus);
        }
        self.run_bindings(window.unwrap_or(root), &Event::GainFocus);
    }

    /// Focused descendant of a top-level widget.
    pub fn focused(
        &self,
        toplevel: WidgetId,
    ) -> Option<WidgetId> {
        if toplevel == self.root() {
            return self.wm.root_focus;
        }
        self.window_data(toplevel).and_then(|data| data.focus)
    }

    /// Give keyboard focus to `id` within its window (or the root).
    pub fn focus(
        &mut self,
        id: WidgetId,
    ) {
        let top = self.tree.toplevel(id);
        if top == self.root() {
            self.wm.root_focus = Some(id);
        } else if let Some(data) = self.window_data_mut(top) {
            data.focus = Some(id);
        }
    }

    /// Move a window so that `pos - grab` is its top-left corner.
    pub(crate) fn drag_window(
        &mut self,
        window: WidgetId,
        pos: Point,
        grab: Point,
    ) {
        let screen = self.config.screen;
        let restrict = self.window_data(window).is_some_and(|data| data.restrict_position);
        let Some(node) = self.tree.get_mut(window) else {
            return;
        };
        let mut top_left = pos - grab;
        if restrict {
            let max_x = screen.width.saturating_sub(node.rect.size.width) as i32;
            let max_y = screen.height.saturating_sub(node.rect.size.height) as i32;
            top_left = Point::new(top_left.x.clamp(0, max_x), top_left.y.clamp(0, max_y));
        }
        node.rect.top_left = top_left;
    }

    pub fn is_modal(
        &self,
        window: WidgetId,
    ) -> bool {
        self.window_data(window).is_some_and(|data| data.modal)
    }
}
