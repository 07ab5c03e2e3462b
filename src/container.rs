//! Scrollable containers: view offset, content size and clip-aware hit-testing.
//!
//! A container shows the window `[offset, offset + view_size]` of a content area of
//! `content` pixels. The offset is clamped on every write so the view never leaves
//! `[0, content]`. Hit-testing descends depth-first through the topmost
//! (last-packed) child whose rect contains the point *and* whose point lies inside
//! the container's view, so children scrolled out of view are never hit.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::{ContainsPoint, Rectangle};

use crate::widget::{WidgetId, WidgetKind, WidgetTree};

/// Scroll state of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct View {
    /// Top-left of the visible window into the content.
    pub offset: Point,
    /// Total content size.
    pub content: Size,
    /// Scrollbar driving the horizontal offset.
    pub xscroll: Option<WidgetId>,
    /// Scrollbar driving the vertical offset.
    pub yscroll: Option<WidgetId>,
}

impl View {
    /// Grow the content so `rect` plus `margin` fits.
    pub fn grow_to(
        &mut self,
        rect: Rectangle,
        margin: u32,
    ) {
        let right = (rect.top_left.x.max(0) as u32) + rect.size.width + margin;
        let bottom = (rect.top_left.y.max(0) as u32) + rect.size.height + margin;
        self.content.width = self.content.width.max(right);
        self.content.height = self.content.height.max(bottom);
    }

    /// Largest valid offset for a view of `view` pixels.
    pub const fn max_offset(
        &self,
        view: Size,
    ) -> Point {
        Point::new(
            self.content.width.saturating_sub(view.width) as i32,
            self.content.height.saturating_sub(view.height) as i32,
        )
    }

    /// Clamp `offset` into `[0, content - view]` on both axes.
    pub fn clamp(
        &mut self,
        view: Size,
    ) {
        let max = self.max_offset(view);
        self.offset = Point::new(self.offset.x.clamp(0, max.x), self.offset.y.clamp(0, max.y));
    }
}

/// Axis of a scrollable range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One step of a hit-test path: a widget and the point relative to its top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub widget: WidgetId,
    pub local: Point,
}

impl WidgetTree {
    /// Set a container's view offset, clamped into its content.
    pub fn set_view_offset(
        &mut self,
        id: WidgetId,
        offset: Point,
    ) {
        if let Some(node) = self.get_mut(id) {
            let view_size = node.view_size();
            node.view.offset = offset;
            node.view.clamp(view_size);
        }
    }

    /// Scroll horizontally to `fraction` of the scrollable range.
    pub fn xview(
        &mut self,
        id: WidgetId,
        fraction: f32,
    ) {
        self.scroll_to(id, Orientation::Horizontal, fraction);
    }

    /// Scroll vertically to `fraction` of the scrollable range.
    pub fn yview(
        &mut self,
        id: WidgetId,
        fraction: f32,
    ) {
        self.scroll_to(id, Orientation::Vertical, fraction);
    }

    fn scroll_to(
        &mut self,
        id: WidgetId,
        axis: Orientation,
        fraction: f32,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let max = node.view.max_offset(node.view_size());
        let mut offset = node.view.offset;
        match axis {
            Orientation::Horizontal => offset.x = (max.x as f32 * fraction).round() as i32,
            Orientation::Vertical => offset.y = (max.y as f32 * fraction).round() as i32,
        }
        self.set_view_offset(id, offset);
    }

    /// Visible fraction `[low, high]` of the content along `axis`.
    pub fn visible_range(
        &self,
        id: WidgetId,
        axis: Orientation,
    ) -> (f32, f32) {
        let Some(node) = self.get(id) else {
            return (0.0, 1.0);
        };
        let view = node.view_size();
        let (offset, length, total) = match axis {
            Orientation::Horizontal => (node.view.offset.x, view.width, node.view.content.width),
            Orientation::Vertical => (node.view.offset.y, view.height, node.view.content.height),
        };
        if total == 0 || length >= total {
            return (0.0, 1.0);
        }
        let low = offset as f32 / total as f32;
        let high = (offset as f32 + length as f32) / total as f32;
        (low.clamp(0.0, 1.0), high.clamp(0.0, 1.0))
    }

    /// Find the child of `container` under `local` (relative to the container's
    /// top-left corner), returning it with the point in the child's frame.
    pub fn hit_child(
        &self,
        container: WidgetId,
        local: Point,
    ) -> Option<Hit> {
        let node = self.get(container)?;
        if !node.kind.is_container() {
            return None;
        }
        let inner = local - node.inset();

        // Chrome sits outside the scrolled view (title bar decorations)
        for &child_id in node.children.iter().rev() {
            let Some(child) = self.get(child_id) else { continue };
            if child.chrome && child.visible && child.rect.contains(inner) {
                let child_local = inner - child.rect.top_left;
                if child.accepts(child_local) {
                    return Some(Hit { widget: child_id, local: child_local });
                }
            }
        }

        if !Rectangle::new(Point::zero(), node.view_size()).contains(inner) {
            return None;
        }
        let content = inner + node.view.offset;
        for &child_id in node.children.iter().rev() {
            let Some(child) = self.get(child_id) else { continue };
            if child.chrome || !child.visible || !child.rect.contains(content) {
                continue;
            }
            let child_local = content - child.rect.top_left;
            if child.accepts(child_local) {
                return Some(Hit { widget: child_id, local: child_local });
            }
        }
        None
    }

    /// Hit-test path from `top` (a top-level widget) down to the deepest widget
    /// under `local`, which is relative to `top`'s top-left corner.
    pub fn hit_path(
        &self,
        top: WidgetId,
        local: Point,
    ) -> Vec<Hit> {
        let mut path = vec![Hit { widget: top, local }];
        let mut current = Hit { widget: top, local };
        while let Some(hit) = self.hit_child(current.widget, current.local) {
            path.push(hit);
            current = hit;
        }
        path
    }

    /// Whether `point` (screen coordinates) falls in the title bar of `window`.
    pub fn in_title_bar(
        &self,
        window: WidgetId,
        point: Point,
    ) -> bool {
        let Some(node) = self.get(window) else {
            return false;
        };
        if !matches!(&node.kind, WidgetKind::Window(data) if data.title.is_some()) {
            return false;
        }
        let local = point - node.rect.top_left;
        local.y >= 0 && local.y < node.inset().y && local.x >= 0 && local.x < node.rect.size.width as i32
    }
}
