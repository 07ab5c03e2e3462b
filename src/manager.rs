//! Window manager: stacks, event routing and the manager-held widget references.
//!
//! # Pointer Events
//!
//! 1. While a drag is active, motion goes straight to the dragged widget. Any other
//!    event ends the drag; button events are consumed by ending it.
//! 2. The target is the deepest widget under the pointer inside the topmost shown
//!    popup or window (popups above windows, newest first), else inside the root.
//! 3. The hover chain is re-resolved and `Leave`/`Enter` are synthesized from the
//!    difference, before the event is delivered or swallowed.
//! 4. While the active window is modal, targets outside its subtree are swallowed.
//! 5. Button-down closes open popups when it lands outside them and activates
//!    (raises) the window it lands in.
//! 6. Primary button-down over a drag handle starts a drag; otherwise it arms the
//!    double-click timer or, when already armed, produces a `DoubleClick`.
//!
//! # Key Events
//!
//! With popups open the topmost popup takes every key. Otherwise keys go to the
//! focused widget of the active window (or of the root), falling back to the
//! top-level widget itself when the focused widget does not consume them.
//!
//! # References
//!
//! Every widget handle the manager holds is cleared when the widget is destroyed,
//! before its arena slot is released: the stacks, the active window, the hover
//! chain, the pressed widget, the drag target, the focus slots and the timers.

use std::time::Instant;

use embedded_graphics::geometry::Point;
use embedded_graphics::primitives::ContainsPoint;

use crate::app::Application;
use crate::config::{SCROLL_REPEAT_DELAY, SCROLL_REPEAT_INTERVAL, SCROLL_STEP, WHEEL_STEP};
use crate::container::Hit;
use crate::event::{Event, MouseButton};
use crate::timer::{TimerAction, TimerId};
use crate::widget::{WidgetId, WidgetKind};
use crate::widgets::ButtonRole;

/// Widget being dragged and where it was grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragState {
    pub widget: WidgetId,
    /// Grab point relative to the dragged widget's top-left corner.
    pub grab: Point,
}

/// Stacks and input state owned by the [`Application`].
#[derive(Debug, Default)]
pub struct WindowManager {
    /// Shown windows in paint order; the last one is topmost.
    pub(crate) windows: Vec<WidgetId>,
    /// Open popup chain, painted above every window.
    pub(crate) popups: Vec<WidgetId>,
    pub(crate) active: Option<WidgetId>,
    pub(crate) root_focus: Option<WidgetId>,
    /// Hover chain, leaf first.
    pub(crate) mouse_over: Vec<WidgetId>,
    pub(crate) pressed: Option<WidgetId>,
    pub(crate) drag: Option<DragState>,
    pub(crate) double_click: Option<TimerId>,
    pub(crate) scroll_repeat: Option<TimerId>,
    pub(crate) sub_popup: Option<(WidgetId, TimerId)>,
    /// Last known pointer position.
    pub(crate) pointer: Point,
}

impl WindowManager {
    /// Double-click window elapsed.
    pub(crate) fn expire_double_click(
        &mut self,
        timer: TimerId,
    ) {
        if self.double_click == Some(timer) {
            self.double_click = None;
        }
    }

    #[inline]
    pub const fn is_double_click_armed(&self) -> bool { self.double_click.is_some() }

    /// Drop every reference into `ids`.
    pub(crate) fn forget(
        &mut self,
        ids: &[WidgetId],
    ) {
        self.windows.retain(|w| !ids.contains(w));
        self.popups.retain(|p| !ids.contains(p));
        self.mouse_over.retain(|m| !ids.contains(m));
        if self.active.is_some_and(|a| ids.contains(&a)) {
            self.active = None;
        }
        if self.root_focus.is_some_and(|f| ids.contains(&f)) {
            self.root_focus = None;
        }
        if self.pressed.is_some_and(|p| ids.contains(&p)) {
            self.pressed = None;
            self.scroll_repeat = None;
        }
        if self.drag.is_some_and(|d| ids.contains(&d.widget)) {
            self.drag = None;
        }
        if self.sub_popup.is_some_and(|(item, _)| ids.contains(&item)) {
            self.sub_popup = None;
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

impl Application {
    /// Dispatch one input event at the current time.
    pub fn dispatch(
        &mut self,
        event: Event,
    ) {
        self.dispatch_at(event, Instant::now());
    }

    /// Dispatch one input event that happened at `now`.
    pub fn dispatch_at(
        &mut self,
        event: Event,
        now: Instant,
    ) {
        if now > self.now {
            self.now = now;
        }
        self.fire_due_timers();
        if let Some(pos) = event.pos() {
            self.wm.pointer = pos;
        }

        if matches!(event, Event::Quit) {
            let root = self.root();
            self.run_bindings(root, &Event::Quit);
            self.exit();
            return;
        }

        if let Some(drag) = self.wm.drag {
            if let Event::Motion { pos } = event {
                self.drag_to(drag, pos);
                return;
            }
            self.end_drag();
            if event.is_pointer() {
                self.refresh_hover();
                return;
            }
        }

        if event.is_key() {
            self.route_key(event);
        } else if let Some(pos) = event.pos() {
            self.route_pointer(event, pos);
        }
    }

    fn route_key(
        &mut self,
        event: Event,
    ) {
        if let Some(&popup) = self.wm.popups.last() {
            if let Event::KeyDown { key } = event
                && self.popup_key(popup, key)
            {
                return;
            }
            self.process_event(popup, &event);
            return;
        }

        let top = self.wm.active.unwrap_or_else(|| self.root());
        if let Some(focused) = self.focused(top)
            && focused != top
            && self.tree.is_shown(focused)
            && self.process_event(focused, &event)
        {
            return;
        }
        self.process_event(top, &event);
    }

    fn route_pointer(
        &mut self,
        event: Event,
        pos: Point,
    ) {
        let path = self.hit_path_at(pos);
        let Some(&leaf) = path.last() else {
            return;
        };
        let chain = self.hover_chain(&path);
        self.update_hover(chain);

        if !self.modal_allows(leaf.widget) {
            tracing::trace!(target = ?leaf.widget, "event swallowed by modal window");
            return;
        }

        match event {
            Event::ButtonDown { button, .. } => self.button_down(&path, leaf, button, pos, event),
            Event::ButtonUp { .. } => {
                self.deliver(leaf, event);
                self.release_pressed();
            }
            _ => self.deliver(leaf, event),
        }
    }

    fn button_down(
        &mut self,
        path: &[Hit],
        leaf: Hit,
        button: MouseButton,
        pos: Point,
        event: Event,
    ) {
        let root = self.root();
        let top = path.first().map_or(root, |hit| hit.widget);

        if !self.wm.popups.is_empty() && !self.wm.popups.contains(&top) {
            self.close_all_popups();
        }
        if self.is_window(top) {
            if self.wm.active != Some(top) {
                self.set_active_window(Some(top));
            }
        } else if top == root && self.wm.active.is_some() {
            self.set_active_window(None);
        }
        if !self.tree.contains(leaf.widget) {
            return;
        }

        let mut double_click = false;
        if button.is_primary() {
            if let Some(drag) = self.drag_handle(leaf, pos) {
                self.cancel_double_click();
                tracing::trace!(widget = ?drag.widget, "drag started");
                self.wm.drag = Some(drag);
            } else if let Some(timer) = self.wm.double_click.take() {
                self.timers.cancel(timer);
                double_click = true;
            } else {
                let deadline = self.now + self.config.double_click;
                self.wm.double_click = Some(self.timers.schedule(deadline, TimerAction::DoubleClickExpired));
            }
        } else {
            self.cancel_double_click();
            if button.is_wheel() {
                self.wheel(path, button);
            }
        }

        self.deliver(leaf, event);
        if double_click && self.tree.contains(leaf.widget) {
            self.deliver(leaf, Event::DoubleClick { pos });
        }
    }

    fn cancel_double_click(&mut self) {
        if let Some(timer) = self.wm.double_click.take() {
            self.timers.cancel(timer);
        }
    }

    /// Deliver `event` to a hit widget in its local coordinates.
    fn deliver(
        &mut self,
        hit: Hit,
        event: Event,
    ) {
        self.process_event(hit.widget, &event.with_pos(hit.local));
    }

    fn release_pressed(&mut self) {
        self.wm.pressed = None;
        if let Some(timer) = self.wm.scroll_repeat.take() {
            self.timers.cancel(timer);
        }
    }

    // -------------------------------------------------------------------------
    // Hit-testing
    // -------------------------------------------------------------------------

    /// Topmost shown popup or window containing `pos`, else the root.
    fn hit_top(
        &self,
        pos: Point,
    ) -> WidgetId {
        self.wm
            .windows
            .iter()
            .chain(self.wm.popups.iter())
            .rev()
            .copied()
            .find(|&id| {
                self.tree.get(id).is_some_and(|node| {
                    node.visible && node.rect.contains(pos) && node.accepts(pos - node.rect.top_left)
                })
            })
            .unwrap_or_else(|| self.root())
    }

    fn hit_path_at(
        &self,
        pos: Point,
    ) -> Vec<Hit> {
        let top = self.hit_top(pos);
        let origin = self.tree.get(top).map_or(Point::zero(), |node| node.rect.top_left);
        self.tree.hit_path(top, pos - origin)
    }

    /// Window or popup under `pos`, if any.
    pub fn hit_window(
        &self,
        pos: Point,
    ) -> Option<WidgetId> {
        Some(self.hit_top(pos)).filter(|&top| top != self.root())
    }

    /// Deepest widget under `pos`.
    pub fn hit_test(
        &self,
        pos: Point,
    ) -> WidgetId {
        self.hit_path_at(pos).last().map_or_else(|| self.root(), |hit| hit.widget)
    }

    fn modal_window(&self) -> Option<WidgetId> { self.wm.active.filter(|&window| self.is_modal(window)) }

    /// Whether input may reach `id` under the current modality.
    fn modal_allows(
        &self,
        id: WidgetId,
    ) -> bool {
        self.modal_window().is_none_or(|modal| self.tree.is_descendant(id, modal))
    }

    // -------------------------------------------------------------------------
    // Hover
    // -------------------------------------------------------------------------

    fn hover_chain(
        &self,
        path: &[Hit],
    ) -> Vec<WidgetId> {
        path.iter().rev().map(|hit| hit.widget).filter(|&id| self.modal_allows(id)).collect()
    }

    /// Replace the hover chain, sending `Leave` (leaf first) to widgets that left
    /// it and `Enter` (outermost first) to widgets that joined it.
    fn update_hover(
        &mut self,
        chain: Vec<WidgetId>,
    ) {
        let old = core::mem::replace(&mut self.wm.mouse_over, chain.clone());
        for &id in old.iter().filter(|id| !chain.contains(id)) {
            if self.tree.contains(id) {
                self.process_event(id, &Event::Leave);
            }
        }
        for &id in chain.iter().rev().filter(|id| !old.contains(id)) {
            if self.wm.mouse_over.contains(&id) {
                self.process_event(id, &Event::Enter);
            }
        }
    }

    /// Re-resolve the hover chain at the last pointer position.
    pub(crate) fn refresh_hover(&mut self) {
        let path = self.hit_path_at(self.wm.pointer);
        let chain = self.hover_chain(&path);
        self.update_hover(chain);
    }

    pub fn mouse_over(&self) -> &[WidgetId] { &self.wm.mouse_over }

    pub fn is_hovered(
        &self,
        id: WidgetId,
    ) -> bool {
        self.wm.mouse_over.first() == Some(&id)
    }

    pub const fn pressed(&self) -> Option<WidgetId> { self.wm.pressed }

    pub const fn is_dragging(&self) -> bool { self.wm.drag.is_some() }

    // -------------------------------------------------------------------------
    // Drag
    // -------------------------------------------------------------------------

    /// Drag target for a primary press on `leaf`: an enabled scrollbar thumb, or a
    /// window pressed in its title bar.
    fn drag_handle(
        &self,
        leaf: Hit,
        pos: Point,
    ) -> Option<DragState> {
        let node = self.tree.get(leaf.widget)?;
        match node.kind {
            WidgetKind::ScrollThumb if node.is_enabled() => Some(DragState { widget: leaf.widget, grab: leaf.local }),
            WidgetKind::Window(_) if self.tree.in_title_bar(leaf.widget, pos) => {
                Some(DragState { widget: leaf.widget, grab: pos - node.rect.top_left })
            }
            _ => None,
        }
    }

    fn drag_to(
        &mut self,
        drag: DragState,
        pos: Point,
    ) {
        let Some(node) = self.tree.get(drag.widget) else {
            self.wm.drag = None;
            return;
        };
        match node.kind {
            WidgetKind::Window(_) => self.drag_window(drag.widget, pos, drag.grab),
            WidgetKind::ScrollThumb => {
                if let Some(bar) = node.parent {
                    let origin = self.tree.content_origin(bar);
                    self.tree.drag_thumb(drag.widget, pos - origin, drag.grab);
                }
            }
            _ => {}
        }
    }

    fn end_drag(&mut self) {
        if let Some(drag) = self.wm.drag.take() {
            tracing::trace!(widget = ?drag.widget, "drag ended");
        }
        self.release_pressed();
    }

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Step the scrollbar of the innermost scrollable container on the path.
    fn wheel(
        &mut self,
        path: &[Hit],
        button: MouseButton,
    ) {
        let direction = if button == MouseButton::WheelUp { -1 } else { 1 };
        let bar = path.iter().rev().find_map(|hit| {
            let view = self.tree.get(hit.widget)?.view;
            view.yscroll.or(view.xscroll)
        });
        if let Some(bar) = bar {
            self.tree.step_scrollbar(bar, direction, WHEEL_STEP);
        }
    }

    fn step_button(
        &mut self,
        step: WidgetId,
    ) -> bool {
        let Some(node) = self.tree.get(step) else {
            return false;
        };
        let (WidgetKind::ScrollStep(data), Some(bar)) = (&node.kind, node.parent) else {
            return false;
        };
        let direction = data.direction;
        self.tree.step_scrollbar(bar, direction, SCROLL_STEP)
    }

    /// Auto-repeat of a held scrollbar step button.
    pub(crate) fn repeat_scroll_step(
        &mut self,
        step: WidgetId,
        timer: TimerId,
    ) {
        if self.wm.scroll_repeat != Some(timer) {
            return;
        }
        self.wm.scroll_repeat = None;
        if self.wm.pressed != Some(step) || !self.step_button(step) {
            return;
        }
        let deadline = self.now + SCROLL_REPEAT_INTERVAL;
        self.wm.scroll_repeat = Some(self.timers.schedule(deadline, TimerAction::ScrollRepeat { step }));
    }

    // -------------------------------------------------------------------------
    // Per-widget processing
    // -------------------------------------------------------------------------

    /// Run the widget's built-in behavior and then its bindings for `event`.
    /// Disabled widgets process nothing. Returns whether anything handled it.
    pub(crate) fn process_event(
        &mut self,
        id: WidgetId,
        event: &Event,
    ) -> bool {
        if !self.tree.get(id).is_some_and(|node| node.is_enabled()) {
            return false;
        }
        let builtin = self.builtin_behavior(id, event);
        let bound = self.run_bindings(id, event);
        builtin || bound
    }

    fn builtin_behavior(
        &mut self,
        id: WidgetId,
        event: &Event,
    ) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        match (&node.kind, *event) {
            (WidgetKind::Button(button), Event::ButtonDown { button: MouseButton::Left, .. }) => {
                let steal_focus = button.steal_focus;
                self.wm.pressed = Some(id);
                if steal_focus {
                    self.focus(id);
                }
                true
            }
            (WidgetKind::Button(button), Event::ButtonUp { pos, button: MouseButton::Left }) => {
                let role = button.role;
                if self.wm.pressed != Some(id) {
                    return false;
                }
                self.wm.pressed = None;
                self.run_bindings(id, &Event::Click { pos });
                if role == ButtonRole::Close && self.tree.contains(id) {
                    let window = self.tree.toplevel(id);
                    self.destroy(window);
                }
                true
            }
            (WidgetKind::ScrollStep(_), Event::ButtonDown { button: MouseButton::Left, .. }) => {
                self.wm.pressed = Some(id);
                self.step_button(id);
                if let Some(timer) = self.wm.scroll_repeat.take() {
                    self.timers.cancel(timer);
                }
                let deadline = self.now + SCROLL_REPEAT_DELAY;
                self.wm.scroll_repeat = Some(self.timers.schedule(deadline, TimerAction::ScrollRepeat { step: id }));
                true
            }
            (WidgetKind::ScrollStep(_), Event::ButtonUp { button: MouseButton::Left, .. }) => {
                self.release_pressed();
                true
            }
            (WidgetKind::ScrollThumb, Event::ButtonDown { button: MouseButton::Left, .. }) => {
                self.wm.pressed = Some(id);
                true
            }
            (WidgetKind::PopupItem(_), Event::Enter | Event::Motion { .. }) => {
                self.hover_item(id);
                true
            }
            (WidgetKind::PopupItem(_), Event::Leave) => {
                if self.wm.sub_popup.is_some_and(|(item, _)| item == id) {
                    self.cancel_sub_popup();
                }
                false
            }
            (WidgetKind::PopupItem(_), Event::ButtonUp { button: MouseButton::Left, .. }) => {
                self.execute_item(id);
                true
            }
            _ => false,
        }
    }

    /// Run the handlers bound to `event`'s trigger on `id`, in binding order.
    /// Returns whether any handler was bound.
    pub(crate) fn run_bindings(
        &mut self,
        id: WidgetId,
        event: &Event,
    ) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        let handlers = node.bindings.handlers(event.trigger());
        for handler in &handlers {
            if !self.tree.contains(id) {
                break;
            }
            handler(self, id, event);
        }
        !handlers.is_empty()
    }

    // -------------------------------------------------------------------------
    // Destruction
    // -------------------------------------------------------------------------

    /// Clear manager, focus and timer references into `ids`.
    pub(crate) fn release_references(
        &mut self,
        ids: &[WidgetId],
    ) {
        if let Some((item, timer)) = self.wm.sub_popup
            && ids.contains(&item)
        {
            self.timers.cancel(timer);
        }
        if self.wm.pressed.is_some_and(|p| ids.contains(&p))
            && let Some(timer) = self.wm.scroll_repeat
        {
            self.timers.cancel(timer);
        }
        self.wm.forget(ids);
        for window in self.tree.find_all(|kind| matches!(kind, WidgetKind::Window(_))) {
            if let Some(data) = self.window_data_mut(window)
                && data.focus.is_some_and(|f| ids.contains(&f))
            {
                data.focus = None;
            }
        }
    }

    /// Destroy a widget, its children and every window or popup it owns.
    ///
    /// When the active window goes away, the nearest owning window still on the
    /// stack becomes active. Destroying the root ends the application.
    pub fn destroy(
        &mut self,
        id: WidgetId,
    ) {
        if !self.tree.contains(id) {
            return;
        }
        if id == self.root() {
            self.exit();
            return;
        }
        let subtree = self.tree.subtree(id);
        // Sub-popups above a destroyed popup close with it, whoever owns them
        if let Some(&lowest) = self.wm.popups.iter().find(|p| subtree.contains(p)) {
            self.close_popup(lowest);
        }
        let lost_active = self.wm.active.filter(|a| subtree.contains(a));
        let fallback = lost_active
            .and_then(|active| self.fallback_window(active))
            .filter(|window| !subtree.contains(window));

        self.release_references(&subtree);
        self.timers.forget_widgets(&subtree);
        self.tree.remove_nodes(id, &subtree);
        tracing::debug!(?id, removed = subtree.len(), "widget destroyed");

        if lost_active.is_some() {
            let root = self.root();
            match fallback {
                Some(window) => {
                    self.wm.active = Some(window);
                    self.raise(window);
                    self.run_bindings(window, &Event::GainFocus);
                }
                None => {
                    self.run_bindings(root, &Event::GainFocus);
                }
            }
        }
        self.refresh_hover();
    }
}
