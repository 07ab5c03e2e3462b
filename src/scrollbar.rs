//! Scrollbars: content-to-thumb mapping, thumb dragging and press-and-hold stepping.
//!
//! A scrollbar stores the visible fraction `[low, high]` of its target container's
//! content. Writing the bar moves the target's view so that
//! `offset = low / (1 - (high - low)) * (content - view)`; growing the target's
//! content writes the bar back without moving the view.
//!
//! # Layout (along the scroll axis)
//!
//! ```text
//! | 2 | step 12 | 4 | ------ track ------ | 4 | step 12 | 2 |
//! 0               18                 len-18              len
//! ```

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::app::Application;
use crate::colors::DARK_GRAY;
use crate::config::{DECORATION_SIZE, SCROLLBAR_END, SCROLLBAR_THICKNESS};
use crate::container::Orientation;
use crate::error::UiError;
use crate::style::{StyleClass, StyleKey, StyleValue};
use crate::widget::{WidgetId, WidgetKind, WidgetState, WidgetTree};

/// Smallest thumb length along the track.
const MIN_THUMB: u32 = 6;

/// Scrollbar state.
#[derive(Clone, Debug, PartialEq)]
pub struct Scrollbar {
    pub orientation: Orientation,
    pub low: f32,
    pub high: f32,
    /// Container whose view this scrollbar drives.
    pub target: Option<WidgetId>,
    pub(crate) decrease: Option<WidgetId>,
    pub(crate) increase: Option<WidgetId>,
    pub(crate) thumb: Option<WidgetId>,
}

impl Scrollbar {
    pub const fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            low: 0.0,
            high: 1.0,
            target: None,
            decrease: None,
            increase: None,
            thumb: None,
        }
    }

    /// Visible fraction of the content.
    #[inline]
    pub fn size(&self) -> f32 { self.high - self.low }

    /// Nothing to scroll when the whole content is visible.
    #[inline]
    pub fn is_full(&self) -> bool { self.size() >= 1.0 - f32::EPSILON }

    /// Fraction of the scrollable range the bar's position represents.
    pub fn view_fraction(&self) -> f32 {
        let free = 1.0 - self.size();
        if free <= f32::EPSILON { 0.0 } else { (self.low / free).clamp(0.0, 1.0) }
    }
}

/// Step button of a scrollbar. `direction` is `-1` (towards the start) or `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollStep {
    pub direction: i32,
    pub orientation: Orientation,
}

/// Length of the scrollbar along its axis.
const fn along(
    size: Size,
    orientation: Orientation,
) -> u32 {
    match orientation {
        Orientation::Horizontal => size.width,
        Orientation::Vertical => size.height,
    }
}

/// Build a rect from along-axis and cross-axis coordinates.
const fn oriented_rect(
    orientation: Orientation,
    along_pos: i32,
    cross_pos: i32,
    along_len: u32,
    cross_len: u32,
) -> Rectangle {
    match orientation {
        Orientation::Horizontal => Rectangle::new(Point::new(along_pos, cross_pos), Size::new(along_len, cross_len)),
        Orientation::Vertical => Rectangle::new(Point::new(cross_pos, along_pos), Size::new(cross_len, along_len)),
    }
}

/// Track length available to the thumb.
const fn track_len(length: u32) -> u32 {
    length.saturating_sub(2 * SCROLLBAR_END as u32)
}

/// Thumb start offset and length along a bar of `length` pixels.
pub fn thumb_span(
    length: u32,
    low: f32,
    high: f32,
) -> (i32, u32) {
    let track = track_len(length) as f32;
    let start = SCROLLBAR_END + (track * low).round() as i32;
    let len = ((track * (high - low)).round() as u32).max(MIN_THUMB).min(track_len(length));
    (start, len)
}

// =============================================================================
// Tree Operations
// =============================================================================

impl WidgetTree {
    fn scrollbar(
        &self,
        id: WidgetId,
    ) -> Option<&Scrollbar> {
        match &self.get(id)?.kind {
            WidgetKind::Scrollbar(bar) => Some(bar),
            _ => None,
        }
    }

    fn scrollbar_mut(
        &mut self,
        id: WidgetId,
    ) -> Option<&mut Scrollbar> {
        match &mut self.get_mut(id)?.kind {
            WidgetKind::Scrollbar(bar) => Some(bar),
            _ => None,
        }
    }

    /// Current `[low, high]` of a scrollbar.
    pub fn bar(
        &self,
        id: WidgetId,
    ) -> Option<(f32, f32)> {
        self.scrollbar(id).map(|bar| (bar.low, bar.high))
    }

    /// Set the visible fraction of a scrollbar.
    ///
    /// Both ends are clamped to `[0, 1]` and swapped if reversed. A full range
    /// disables the scrollbar. With `update_view` the target container scrolls to
    /// match.
    pub fn set_bar(
        &mut self,
        id: WidgetId,
        low: f32,
        high: f32,
        update_view: bool,
    ) {
        let sanitize = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (mut low, mut high) = (sanitize(low), sanitize(high));
        if low > high {
            core::mem::swap(&mut low, &mut high);
        }
        let Some(bar) = self.scrollbar_mut(id) else {
            return;
        };
        bar.low = low;
        bar.high = high;
        let state = if bar.is_full() { WidgetState::Disabled } else { WidgetState::Enabled };
        let fraction = bar.view_fraction();
        let (orientation, target) = (bar.orientation, bar.target);
        let parts = [bar.decrease, bar.increase, bar.thumb];

        if let Some(node) = self.get_mut(id) {
            node.state = state;
        }
        for part in parts.into_iter().flatten() {
            if let Some(node) = self.get_mut(part) {
                node.state = state;
            }
        }
        self.layout_scrollbar(id);

        if update_view && let Some(target) = target {
            match orientation {
                Orientation::Horizontal => self.xview(target, fraction),
                Orientation::Vertical => self.yview(target, fraction),
            }
        }
    }

    /// Place the step buttons and the thumb for the current bar.
    pub(crate) fn layout_scrollbar(
        &mut self,
        id: WidgetId,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        let WidgetKind::Scrollbar(bar) = &node.kind else {
            return;
        };
        let orientation = bar.orientation;
        let length = along(node.rect.size, orientation);
        let cross = 2;
        let (start, thumb_len) = thumb_span(length, bar.low, bar.high);
        let placements = [
            (bar.decrease, oriented_rect(orientation, 2, cross, DECORATION_SIZE, DECORATION_SIZE)),
            (
                bar.increase,
                oriented_rect(orientation, length as i32 - 14, cross, DECORATION_SIZE, DECORATION_SIZE),
            ),
            (bar.thumb, oriented_rect(orientation, start, cross, thumb_len, DECORATION_SIZE)),
        ];
        for (part, rect) in placements {
            if let Some(part) = part
                && let Some(node) = self.get_mut(part)
            {
                node.rect = rect;
            }
        }
    }

    /// Write a container's visible range into the scrollbars attached to it
    /// without moving its view.
    pub fn sync_scrollbars(
        &mut self,
        container: WidgetId,
    ) {
        let Some(view) = self.get(container).map(|node| node.view) else {
            return;
        };
        if let Some(bar) = view.xscroll {
            let (low, high) = self.visible_range(container, Orientation::Horizontal);
            self.set_bar(bar, low, high, false);
        }
        if let Some(bar) = view.yscroll {
            let (low, high) = self.visible_range(container, Orientation::Vertical);
            self.set_bar(bar, low, high, false);
        }
    }

    /// Link `scrollbar` to `container` along the scrollbar's orientation.
    pub fn attach_scrollbar(
        &mut self,
        scrollbar: WidgetId,
        container: WidgetId,
    ) -> Result<(), UiError> {
        let actual = self.node(scrollbar)?.kind.name();
        let orientation = self
            .scrollbar(scrollbar)
            .map(|bar| bar.orientation)
            .ok_or(UiError::WrongKind { id: scrollbar, expected: "scrollbar", actual })?;
        let target = self.node_mut(container)?;
        if !target.kind.is_container() {
            return Err(UiError::NotAContainer(container));
        }
        match orientation {
            Orientation::Horizontal => target.view.xscroll = Some(scrollbar),
            Orientation::Vertical => target.view.yscroll = Some(scrollbar),
        }
        if let Some(bar) = self.scrollbar_mut(scrollbar) {
            bar.target = Some(container);
        }
        self.sync_scrollbars(container);
        Ok(())
    }

    /// Move the bar by `amount` towards `direction`, holding its size. Returns
    /// whether anything moved.
    pub fn step_scrollbar(
        &mut self,
        id: WidgetId,
        direction: i32,
        amount: f32,
    ) -> bool {
        let Some(bar) = self.scrollbar(id) else {
            return false;
        };
        let size = bar.size();
        let low = bar.low;
        let can_move = (direction > 0 && low < 1.0 - size) || (direction < 0 && low > 0.0);
        if !can_move || bar.is_full() {
            return false;
        }
        let new_low = (low + amount * direction as f32).clamp(0.0, 1.0 - size);
        self.set_bar(id, new_low, new_low + size, true);
        true
    }

    /// Drag the thumb so its leading edge sits at `pos - grab` (scrollbar frame).
    pub fn drag_thumb(
        &mut self,
        thumb: WidgetId,
        pos: Point,
        grab: Point,
    ) {
        let Some(bar_id) = self.get(thumb).and_then(|node| node.parent) else {
            return;
        };
        let Some(node) = self.get(bar_id) else {
            return;
        };
        let WidgetKind::Scrollbar(bar) = &node.kind else {
            return;
        };
        let length = along(node.rect.size, bar.orientation);
        let track = track_len(length);
        if track == 0 || bar.is_full() {
            return;
        }
        let size = bar.size();
        let (_, thumb_len) = thumb_span(length, bar.low, bar.high);
        let lead = match bar.orientation {
            Orientation::Horizontal => pos.x - grab.x,
            Orientation::Vertical => pos.y - grab.y,
        };
        let max_lead = (SCROLLBAR_END + track as i32 - thumb_len as i32).max(SCROLLBAR_END);
        let lead = lead.clamp(SCROLLBAR_END, max_lead);
        let low = ((lead - SCROLLBAR_END) as f32 / track as f32).clamp(0.0, 1.0 - size);
        self.set_bar(bar_id, low, low + size, true);
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Application {
    /// Create and pack a scrollbar with its step buttons and thumb.
    ///
    /// `rect` is the scrollbar's rect in `parent`'s content frame. The cross-axis
    /// thickness is forced to the standard thickness.
    pub fn scrollbar(
        &mut self,
        parent: WidgetId,
        rect: Rectangle,
        orientation: Orientation,
    ) -> Result<WidgetId, UiError> {
        let size = match orientation {
            Orientation::Horizontal => Size::new(rect.size.width.max(2 * SCROLLBAR_END as u32), SCROLLBAR_THICKNESS),
            Orientation::Vertical => Size::new(SCROLLBAR_THICKNESS, rect.size.height.max(2 * SCROLLBAR_END as u32)),
        };
        let rect = Rectangle::new(rect.top_left, size);
        let bar = self.create_styled(
            parent,
            rect,
            WidgetKind::Scrollbar(Scrollbar::new(orientation)),
            StyleClass::Scrollbar,
            &[],
        )?;
        let thumb_style = [(StyleKey::Background, StyleValue::Color(DARK_GRAY))];
        let decrease = self.create_styled(
            bar,
            Rectangle::zero(),
            WidgetKind::ScrollStep(ScrollStep { direction: -1, orientation }),
            StyleClass::ScrollButton,
            &[],
        )?;
        let increase = self.create_styled(
            bar,
            Rectangle::zero(),
            WidgetKind::ScrollStep(ScrollStep { direction: 1, orientation }),
            StyleClass::ScrollButton,
            &[],
        )?;
        let thumb = self.create_styled(bar, Rectangle::zero(), WidgetKind::ScrollThumb, StyleClass::ScrollButton, &thumb_style)?;

        if let Some(WidgetKind::Scrollbar(data)) = self.tree.get_mut(bar).map(|node| &mut node.kind) {
            data.decrease = Some(decrease);
            data.increase = Some(increase);
            data.thumb = Some(thumb);
        }
        for part in [decrease, increase, thumb] {
            self.tree.pack(part)?;
        }
        self.tree.pack(bar)?;
        self.tree.set_bar(bar, 0.0, 1.0, false);
        Ok(bar)
    }

    /// Link a scrollbar to the container it scrolls.
    pub fn attach_scrollbar(
        &mut self,
        scrollbar: WidgetId,
        container: WidgetId,
    ) -> Result<(), UiError> {
        self.tree.attach_scrollbar(scrollbar, container)
    }

    /// Set a scrollbar's visible range and scroll its container to match.
    pub fn set_bar(
        &mut self,
        scrollbar: WidgetId,
        low: f32,
        high: f32,
    ) {
        self.tree.set_bar(scrollbar, low, high, true);
    }

    pub fn bar(
        &self,
        scrollbar: WidgetId,
    ) -> Option<(f32, f32)> {
        self.tree.bar(scrollbar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn rect(
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    ) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    /// Container with 100px view over 400px content and a linked horizontal bar.
    fn scrolled() -> (Application, WidgetId, WidgetId) {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let container = app.add(root, rect(0, 0, 100, 50), WidgetKind::Panel).unwrap();
        app.add(container, rect(0, 0, 396, 20), WidgetKind::Panel).unwrap();
        let bar = app.scrollbar(root, rect(0, 50, 100, 16), Orientation::Horizontal).unwrap();
        app.attach_scrollbar(bar, container).unwrap();
        (app, container, bar)
    }

    #[test]
    fn test_attach_syncs_bar() {
        let (app, _, bar) = scrolled();
        let (low, high) = app.bar(bar).unwrap();
        assert!(low.abs() < 1e-6);
        assert!((high - 0.25).abs() < 1e-6, "100 of 400 pixels visible");
        assert_eq!(app.tree.get(bar).unwrap().state(), WidgetState::Enabled);
    }

    #[test]
    fn test_set_bar_round_trip() {
        let (mut app, container, bar) = scrolled();
        for &(low, high) in &[(0.0, 0.25), (0.3, 0.55), (0.75, 1.0), (0.5, 0.75)] {
            app.set_bar(bar, low, high);
            assert_eq!(app.bar(bar), Some((low, high)));
            let expected = low / (1.0 - (high - low)) * 300.0;
            let offset = app.view_offset(container).x as f32;
            assert!((offset - expected).abs() <= 1.0, "offset {offset} vs {expected} for ({low}, {high})");
        }
    }

    #[test]
    fn test_set_bar_clamps_and_orders() {
        let (mut app, _, bar) = scrolled();
        app.set_bar(bar, -0.5, 0.2);
        assert_eq!(app.bar(bar), Some((0.0, 0.2)));
        app.set_bar(bar, 0.9, 0.4);
        assert_eq!(app.bar(bar), Some((0.4, 0.9)));
        app.set_bar(bar, 0.5, 3.0);
        assert_eq!(app.bar(bar), Some((0.5, 1.0)));
    }

    #[test]
    fn test_full_range_disables() {
        let (mut app, _, bar) = scrolled();
        app.set_bar(bar, 0.0, 1.0);
        assert_eq!(app.tree.get(bar).unwrap().state(), WidgetState::Disabled);
        let WidgetKind::Scrollbar(data) = app.tree.get(bar).unwrap().kind() else {
            panic!("not a scrollbar");
        };
        let thumb = data.thumb.unwrap();
        assert_eq!(app.tree.get(thumb).unwrap().state(), WidgetState::Disabled);
    }

    #[test]
    fn test_step_holds_size() {
        let (mut app, _, bar) = scrolled();
        assert!(app.tree.step_scrollbar(bar, 1, 0.1));
        let (low, high) = app.bar(bar).unwrap();
        assert!((low - 0.1).abs() < 1e-6);
        assert!((high - low - 0.25).abs() < 1e-6);
        // Stepping backwards past the start stops at zero
        assert!(app.tree.step_scrollbar(bar, -1, 0.5));
        assert_eq!(app.bar(bar).unwrap().0, 0.0);
        assert!(!app.tree.step_scrollbar(bar, -1, 0.1), "already at the start");
    }

    #[test]
    fn test_drag_thumb_maps_track() {
        let (mut app, container, bar) = scrolled();
        let WidgetKind::Scrollbar(data) = app.tree.get(bar).unwrap().kind() else {
            panic!("not a scrollbar");
        };
        let thumb = data.thumb.unwrap();
        // Track is 100 - 36 = 64px starting at 18. Leading edge at 18 + 32 = half way.
        app.tree.drag_thumb(thumb, Point::new(50, 8), Point::new(0, 0));
        let (low, high) = app.bar(bar).unwrap();
        assert!((low - 0.5).abs() < 1e-6);
        assert!((high - 0.75).abs() < 1e-6);
        assert_eq!(app.view_offset(container).x, 200);
        // Dragging far right clamps to the end of the content
        app.tree.drag_thumb(thumb, Point::new(500, 8), Point::new(0, 0));
        assert_eq!(app.bar(bar), Some((0.75, 1.0)));
    }

    #[test]
    fn test_thumb_span() {
        assert_eq!(thumb_span(100, 0.0, 0.25), (18, 16));
        assert_eq!(thumb_span(100, 0.5, 0.51), (50, MIN_THUMB));
    }

    #[test]
    fn test_vertical_layout() {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let bar = app.scrollbar(root, rect(100, 0, 16, 120), Orientation::Vertical).unwrap();
        let WidgetKind::Scrollbar(data) = app.tree.get(bar).unwrap().kind() else {
            panic!("not a scrollbar");
        };
        let increase = data.increase.unwrap();
        assert_eq!(app.tree.get(increase).unwrap().rect(), rect(2, 106, 12, 12));
    }
}
