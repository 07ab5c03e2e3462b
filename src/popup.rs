//! Popup menus: fixed-width item lists stacked above every window.
//!
//! The popup stack is a chain: the first entry is the menu opened by the
//! application, each further entry a sub-popup opened from an item of the entry
//! below it. Dismissal is cascading: closing a popup closes everything above it.
//! Closed popups are hidden, not destroyed, so a menu can be shown again.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::app::Application;
use crate::config::{POPUP_ANCHOR_OFFSET, POPUP_ITEM_HEIGHT, POPUP_SEPARATOR_HEIGHT, POPUP_WIDTH, SUB_POPUP_DELAY};
use crate::error::UiError;
use crate::event::{Event, Key, Trigger};
use crate::style::StyleClass;
use crate::timer::{TimerAction, TimerId};
use crate::widget::{WidgetId, WidgetKind};

/// Popup state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopupData {
    /// Index into the popup's entries of the highlighted item.
    pub selected: Option<usize>,
    next_y: i32,
}

/// Selectable popup entry. An item with a sub-popup opens it instead of running
/// its `Click` bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupItem {
    pub text: String,
    pub submenu: Option<WidgetId>,
}

impl Application {
    fn popup_data(
        &self,
        id: WidgetId,
    ) -> Option<&PopupData> {
        match &self.tree.get(id)?.kind {
            WidgetKind::Popup(data) => Some(data),
            _ => None,
        }
    }

    fn popup_data_mut(
        &mut self,
        id: WidgetId,
    ) -> Option<&mut PopupData> {
        match &mut self.tree.get_mut(id)?.kind {
            WidgetKind::Popup(data) => Some(data),
            _ => None,
        }
    }

    fn item_data(
        &self,
        id: WidgetId,
    ) -> Option<&PopupItem> {
        match &self.tree.get(id)?.kind {
            WidgetKind::PopupItem(item) => Some(item),
            _ => None,
        }
    }

    /// Create an empty hidden popup owned by `owner`.
    pub fn popup(
        &mut self,
        owner: WidgetId,
    ) -> Result<WidgetId, UiError> {
        let rect = Rectangle::new(Point::zero(), Size::new(POPUP_WIDTH, 2));
        let popup = self.create_styled(
            owner,
            rect,
            WidgetKind::Popup(PopupData { selected: None, next_y: 1 }),
            StyleClass::Popup,
            &[],
        )?;
        self.tree.node_mut(popup)?.visible = false;
        Ok(popup)
    }

    fn append_entry(
        &mut self,
        popup: WidgetId,
        height: u32,
        kind: WidgetKind,
    ) -> Result<WidgetId, UiError> {
        let actual = self.tree.node(popup)?.kind.name();
        let y = self
            .popup_data(popup)
            .map(|data| data.next_y)
            .ok_or(UiError::WrongKind { id: popup, expected: "popup", actual })?;
        let class = if matches!(kind, WidgetKind::PopupItem(_)) { StyleClass::PopupItem } else { StyleClass::Popup };
        let rect = Rectangle::new(Point::new(1, y), Size::new(POPUP_WIDTH - 2, height));
        let entry = self.create_styled(popup, rect, kind, class, &[])?;
        self.tree.pack(entry)?;

        let next_y = y + height as i32;
        if let Some(data) = self.popup_data_mut(popup) {
            data.next_y = next_y;
        }
        let node = self.tree.node_mut(popup)?;
        node.rect.size.height = next_y as u32 + 1;
        let view_size = node.view_size();
        node.view.content = view_size;
        Ok(entry)
    }

    /// Append an item that runs `handler` when executed.
    pub fn popup_item(
        &mut self,
        popup: WidgetId,
        text: &str,
        handler: impl Fn(&mut Self, WidgetId, &Event) + 'static,
    ) -> Result<WidgetId, UiError> {
        let item = self.append_entry(
            popup,
            POPUP_ITEM_HEIGHT,
            WidgetKind::PopupItem(PopupItem { text: text.into(), submenu: None }),
        )?;
        self.bind(item, Trigger::Click, handler)?;
        Ok(item)
    }

    /// Append an item that opens `submenu` beside the popup.
    pub fn popup_submenu(
        &mut self,
        popup: WidgetId,
        text: &str,
        submenu: WidgetId,
    ) -> Result<WidgetId, UiError> {
        let actual = self.tree.node(submenu)?.kind.name();
        if self.popup_data(submenu).is_none() {
            return Err(UiError::WrongKind { id: submenu, expected: "popup", actual });
        }
        self.append_entry(
            popup,
            POPUP_ITEM_HEIGHT,
            WidgetKind::PopupItem(PopupItem { text: text.into(), submenu: Some(submenu) }),
        )
    }

    pub fn popup_separator(
        &mut self,
        popup: WidgetId,
    ) -> Result<WidgetId, UiError> {
        self.append_entry(popup, POPUP_SEPARATOR_HEIGHT, WidgetKind::PopupSeparator)
    }

    /// Open `popup` as the first menu of a new chain, just below-right of `anchor`
    /// (screen coordinates). Any open chain is closed first.
    pub fn show_popup(
        &mut self,
        popup: WidgetId,
        anchor: Point,
    ) -> Result<(), UiError> {
        let actual = self.tree.node(popup)?.kind.name();
        if self.popup_data(popup).is_none() {
            return Err(UiError::WrongKind { id: popup, expected: "popup", actual });
        }
        self.close_all_popups();
        let offset = POPUP_ANCHOR_OFFSET;
        self.open_popup_at(popup, anchor + Point::new(offset, offset));
        Ok(())
    }

    fn open_popup_at(
        &mut self,
        popup: WidgetId,
        top_left: Point,
    ) {
        let screen = self.config.screen;
        let Some(node) = self.tree.get_mut(popup) else {
            return;
        };
        let max_x = screen.width.saturating_sub(node.rect.size.width) as i32;
        let max_y = screen.height.saturating_sub(node.rect.size.height) as i32;
        node.rect.top_left = Point::new(top_left.x.clamp(0, max_x), top_left.y.clamp(0, max_y));
        node.visible = true;
        if let Some(data) = self.popup_data_mut(popup) {
            data.selected = None;
        }
        self.wm.popups.retain(|&p| p != popup);
        self.wm.popups.push(popup);
        tracing::debug!(?popup, depth = self.wm.popups.len(), "popup opened");
        self.refresh_hover();
    }

    /// Close `popup` and every popup above it in the chain.
    pub fn close_popup(
        &mut self,
        popup: WidgetId,
    ) {
        let Some(index) = self.wm.popups.iter().position(|&p| p == popup) else {
            return;
        };
        let closed = self.wm.popups.split_off(index);
        for &id in &closed {
            if let Some(node) = self.tree.get_mut(id) {
                node.visible = false;
            }
            if let Some(data) = self.popup_data_mut(id) {
                data.selected = None;
            }
        }
        if let Some((item, timer)) = self.wm.sub_popup
            && self.tree.parent(item).is_none_or(|p| closed.contains(&p))
        {
            self.timers.cancel(timer);
            self.wm.sub_popup = None;
        }
        tracing::debug!(count = closed.len(), "popups closed");
        self.refresh_hover();
    }

    pub fn close_all_popups(&mut self) {
        if let Some(&first) = self.wm.popups.first() {
            self.close_popup(first);
        }
    }

    /// Selectable entries of a popup, in display order.
    fn popup_entries(
        &self,
        popup: WidgetId,
    ) -> Vec<WidgetId> {
        self.tree
            .get(popup)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|&c| self.tree.get(c).is_some_and(|n| !n.chrome))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn selectable(
        &self,
        entry: WidgetId,
    ) -> bool {
        self.tree
            .get(entry)
            .is_some_and(|node| node.is_enabled() && node.visible && matches!(node.kind, WidgetKind::PopupItem(_)))
    }

    /// Highlighted item of a popup.
    pub fn popup_selection(
        &self,
        popup: WidgetId,
    ) -> Option<WidgetId> {
        let index = self.popup_data(popup)?.selected?;
        self.popup_entries(popup).get(index).copied()
    }

    fn select_entry(
        &mut self,
        popup: WidgetId,
        entry: Option<WidgetId>,
    ) {
        let index = entry.and_then(|e| self.popup_entries(popup).iter().position(|&c| c == e));
        if let Some(data) = self.popup_data_mut(popup) {
            data.selected = index;
        }
    }

    /// Move the selection by one selectable item, wrapping around.
    fn move_selection(
        &mut self,
        popup: WidgetId,
        forward: bool,
    ) {
        let entries = self.popup_entries(popup);
        let count = entries.len();
        if count == 0 {
            return;
        }
        let start = self.popup_data(popup).and_then(|data| data.selected);
        let mut index = start.unwrap_or(if forward { count - 1 } else { 0 });
        for _ in 0..count {
            index = if forward { (index + 1) % count } else { (index + count - 1) % count };
            if self.selectable(entries[index]) {
                if let Some(data) = self.popup_data_mut(popup) {
                    data.selected = Some(index);
                }
                return;
            }
        }
    }

    /// Keyboard navigation for the topmost popup. Returns whether the key was used.
    pub(crate) fn popup_key(
        &mut self,
        popup: WidgetId,
        key: Key,
    ) -> bool {
        match key {
            Key::Up => self.move_selection(popup, false),
            Key::Down => self.move_selection(popup, true),
            Key::Enter | Key::Space => match self.popup_selection(popup) {
                Some(item) => self.execute_item(item),
                None => return false,
            },
            Key::Right => {
                let Some(item) = self.popup_selection(popup) else {
                    return false;
                };
                if self.item_data(item).and_then(|data| data.submenu).is_none() {
                    return false;
                }
                self.open_submenu(item);
                if let Some(&sub) = self.wm.popups.last() {
                    self.move_selection(sub, true);
                }
            }
            Key::Left if self.wm.popups.len() > 1 => self.close_popup(popup),
            Key::Escape => self.close_popup(popup),
            _ => return false,
        }
        true
    }

    /// Run a popup item: open its sub-popup, or close the chain and fire `Click`.
    pub fn execute_item(
        &mut self,
        item: WidgetId,
    ) {
        if !self.selectable(item) {
            return;
        }
        if self.item_data(item).and_then(|data| data.submenu).is_some() {
            self.open_submenu(item);
            return;
        }
        tracing::debug!(?item, "popup item executed");
        self.close_all_popups();
        self.run_bindings(item, &Event::Click { pos: Point::zero() });
    }

    /// Show the sub-popup of `item` to the right of it, replacing anything above
    /// the item's popup.
    fn open_submenu(
        &mut self,
        item: WidgetId,
    ) {
        let Some(submenu) = self.item_data(item).and_then(|data| data.submenu) else {
            return;
        };
        let Some(owner) = self.tree.parent(item) else {
            return;
        };
        let Some(index) = self.wm.popups.iter().position(|&p| p == owner) else {
            return;
        };
        if self.wm.popups.get(index + 1) == Some(&submenu) {
            return;
        }
        if let Some(&above) = self.wm.popups.get(index + 1) {
            self.close_popup(above);
        }
        let rect = self.tree.absolute_rect(item);
        let top_left = Point::new(rect.top_left.x + rect.size.width as i32, rect.top_left.y - 1);
        self.open_popup_at(submenu, top_left);
    }

    /// Hover over a popup item: select it, close unrelated sub-popups and arm the
    /// sub-popup delay.
    pub(crate) fn hover_item(
        &mut self,
        item: WidgetId,
    ) {
        let Some(popup) = self.tree.parent(item) else {
            return;
        };
        if self.popup_selection(popup) == Some(item) && self.wm.sub_popup.is_some_and(|(i, _)| i == item) {
            return;
        }
        let selectable = self.selectable(item);
        self.select_entry(popup, selectable.then_some(item));

        let submenu = self.item_data(item).and_then(|data| data.submenu);
        if let Some(index) = self.wm.popups.iter().position(|&p| p == popup)
            && let Some(&above) = self.wm.popups.get(index + 1)
            && Some(above) != submenu
        {
            self.close_popup(above);
        }

        self.cancel_sub_popup();
        if selectable && submenu.is_some() {
            let timer = self.timers.schedule(self.now + SUB_POPUP_DELAY, TimerAction::OpenSubPopup { item });
            self.wm.sub_popup = Some((item, timer));
        }
    }

    pub(crate) fn cancel_sub_popup(&mut self) {
        if let Some((_, timer)) = self.wm.sub_popup.take() {
            self.timers.cancel(timer);
        }
    }

    /// Sub-popup hover delay elapsed.
    pub(crate) fn open_hovered_submenu(
        &mut self,
        item: WidgetId,
        timer: TimerId,
    ) {
        if self.wm.sub_popup != Some((item, timer)) {
            return;
        }
        self.wm.sub_popup = None;
        if self.wm.mouse_over.contains(&item) {
            self.open_submenu(item);
        }
    }

    pub fn popup_stack(&self) -> &[WidgetId] { &self.wm.popups }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::config::AppConfig;
    use crate::event::MouseButton;

    struct Menu {
        app: Application,
        menu: WidgetId,
        sub: WidgetId,
        items: Vec<WidgetId>,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    /// Menu: "Open", separator, "More >" (sub: "Deep"), "Quit".
    fn menu() -> Menu {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let log = Rc::new(RefCell::new(Vec::new()));
        let menu = app.popup(root).unwrap();
        let sub = app.popup(menu).unwrap();

        let l = log.clone();
        let open = app.popup_item(menu, "Open", move |_, _, _| l.borrow_mut().push("open")).unwrap();
        let sep = app.popup_separator(menu).unwrap();
        let more = app.popup_submenu(menu, "More", sub).unwrap();
        let l = log.clone();
        let quit = app.popup_item(menu, "Quit", move |_, _, _| l.borrow_mut().push("quit")).unwrap();
        let l = log.clone();
        let deep = app.popup_item(sub, "Deep", move |_, _, _| l.borrow_mut().push("deep")).unwrap();
        Menu { app, menu, sub, items: vec![open, sep, more, quit, deep], log }
    }

    #[test]
    fn test_items_stack_vertically() {
        let m = menu();
        let rects: Vec<Rectangle> = m.items[..4].iter().map(|&i| m.app.tree.get(i).unwrap().rect()).collect();
        assert_eq!(rects[0].top_left, Point::new(1, 1));
        assert_eq!(rects[1].top_left, Point::new(1, 21));
        assert_eq!(rects[2].top_left, Point::new(1, 31));
        assert_eq!(rects[3].top_left, Point::new(1, 51));
        assert_eq!(m.app.tree.get(m.menu).unwrap().rect().size, Size::new(POPUP_WIDTH, 72));
    }

    #[test]
    fn test_show_popup_clamps_to_screen() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::new(300, 10)).unwrap();
        assert_eq!(m.app.tree.get(m.menu).unwrap().rect().top_left, Point::new(220, 12));
        assert_eq!(m.app.popup_stack(), &[m.menu]);
    }

    #[test]
    fn test_arrow_keys_skip_separator_and_wrap() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            m.app.dispatch(Event::KeyDown { key: Key::Down });
            seen.push(m.app.popup_selection(m.menu).unwrap());
        }
        assert_eq!(seen, vec![m.items[0], m.items[2], m.items[3], m.items[0]]);
        m.app.dispatch(Event::KeyDown { key: Key::Up });
        assert_eq!(m.app.popup_selection(m.menu), Some(m.items[3]), "up wraps to the last item");
    }

    #[test]
    fn test_enter_executes_and_closes_chain() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        m.app.dispatch(Event::KeyDown { key: Key::Down });
        m.app.dispatch(Event::KeyDown { key: Key::Enter });
        assert_eq!(*m.log.borrow(), vec!["open"]);
        assert!(m.app.popup_stack().is_empty());
    }

    #[test]
    fn test_right_opens_submenu_escape_closes_top() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        m.app.dispatch(Event::KeyDown { key: Key::Down });
        m.app.dispatch(Event::KeyDown { key: Key::Down });
        m.app.dispatch(Event::KeyDown { key: Key::Right });
        assert_eq!(m.app.popup_stack(), &[m.menu, m.sub]);
        assert_eq!(m.app.popup_selection(m.sub), Some(m.items[4]));

        m.app.dispatch(Event::KeyDown { key: Key::Escape });
        assert_eq!(m.app.popup_stack(), &[m.menu]);
        m.app.dispatch(Event::KeyDown { key: Key::Escape });
        assert!(m.app.popup_stack().is_empty());
    }

    #[test]
    fn test_hover_opens_submenu_after_delay() {
        let mut m = menu();
        let start = m.app.now;
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        // "More" spans y 31..51 inside a popup placed at (2, 2)
        let over_more = Point::new(20, 2 + 40);
        m.app.dispatch_at(Event::Motion { pos: over_more }, start);
        assert_eq!(m.app.popup_stack(), &[m.menu]);
        m.app.tick(start + Duration::from_millis(100));
        assert_eq!(m.app.popup_stack(), &[m.menu]);
        m.app.tick(start + Duration::from_millis(200));
        assert_eq!(m.app.popup_stack(), &[m.menu, m.sub]);
        let sub_rect = m.app.tree.get(m.sub).unwrap().rect();
        assert_eq!(sub_rect.top_left, Point::new(2 + 1 + 98, 2 + 31 - 1));

        // Hovering another item of the lower popup closes the sub-popup
        m.app.dispatch_at(Event::Motion { pos: Point::new(20, 2 + 5) }, start + Duration::from_millis(300));
        assert_eq!(m.app.popup_stack(), &[m.menu]);
    }

    #[test]
    fn test_click_item_runs_callback() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        let over_quit = Point::new(20, 2 + 60);
        m.app.dispatch(Event::ButtonDown { pos: over_quit, button: MouseButton::Left });
        m.app.dispatch(Event::ButtonUp { pos: over_quit, button: MouseButton::Left });
        assert_eq!(*m.log.borrow(), vec!["quit"]);
        assert!(m.app.popup_stack().is_empty());
    }

    #[test]
    fn test_click_away_closes_without_callback() {
        let mut m = menu();
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        m.app.dispatch(Event::ButtonDown { pos: Point::new(250, 200), button: MouseButton::Left });
        assert!(m.app.popup_stack().is_empty());
        assert!(m.log.borrow().is_empty());
        // The popup is hidden, not destroyed, and can be reopened
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        assert_eq!(m.app.popup_stack(), &[m.menu]);
    }

    #[test]
    fn test_destroy_closes_sub_popups_owned_elsewhere() {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let menu = app.popup(root).unwrap();
        let sub = app.popup(root).unwrap();
        app.popup_item(sub, "Deep", |_, _, _| {}).unwrap();
        app.popup_submenu(menu, "More", sub).unwrap();
        app.show_popup(menu, Point::zero()).unwrap();
        app.dispatch(Event::KeyDown { key: Key::Down });
        app.dispatch(Event::KeyDown { key: Key::Right });
        assert_eq!(app.popup_stack(), &[menu, sub]);

        app.destroy(menu);
        assert!(app.popup_stack().is_empty(), "sub-popup closes with its parent menu");
        assert!(app.contains(sub), "a popup owned by the root survives, hidden");
    }

    #[test]
    fn test_disabled_item_not_executed() {
        let mut m = menu();
        m.app.set_state(m.items[3], crate::widget::WidgetState::Disabled);
        m.app.show_popup(m.menu, Point::zero()).unwrap();
        m.app.execute_item(m.items[3]);
        assert!(m.log.borrow().is_empty());
        assert_eq!(m.app.popup_stack(), &[m.menu]);
    }
}
