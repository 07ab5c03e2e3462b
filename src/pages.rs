//! Page navigation for multi-screen dashboards.
//!
//! A page is a named group of widgets shown together, the store keys the fetch
//! bridge polls while the page is current, and a per-frame update hook that
//! copies the newest snapshot into those widgets.
//!
//! Switching pages hides the old widgets, shows the new ones and replaces the
//! fetch key list. The first poll after the switch already requests the new keys.

use crate::app::{Application, UpdateHook};
use crate::error::UiError;
use crate::store::Snapshot;
use crate::widget::WidgetId;

/// Handle to a registered page.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PageId(usize);

struct Page {
    name: String,
    widgets: Vec<WidgetId>,
    keys: Vec<String>,
    update: Option<UpdateHook>,
}

/// Pages in registration order plus the current one.
#[derive(Default)]
pub struct PageRegistry {
    pages: Vec<Page>,
    current: Option<PageId>,
}

impl PageRegistry {
    fn get(
        &self,
        id: PageId,
    ) -> Result<&Page, UiError> {
        self.pages.get(id.0).ok_or(UiError::UnknownPage(id))
    }

    pub fn len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }
}

impl Application {
    /// Register a page. Its widgets are hidden until the page is shown.
    pub fn register_page(
        &mut self,
        name: &str,
        widgets: Vec<WidgetId>,
        keys: Vec<String>,
        update: impl FnMut(&mut Self, &Snapshot) + 'static,
    ) -> Result<PageId, UiError> {
        for &widget in &widgets {
            self.tree.node(widget)?;
        }
        for &widget in &widgets {
            self.set_page_widget_visible(widget, false)?;
        }
        let id = PageId(self.pages.pages.len());
        self.pages.pages.push(Page {
            name: name.to_owned(),
            widgets,
            keys,
            update: Some(Box::new(update)),
        });
        tracing::debug!(page = name, ?id, "page registered");
        Ok(id)
    }

    /// Make `id` the current page.
    pub fn show_page(
        &mut self,
        id: PageId,
    ) -> Result<(), UiError> {
        let next = self.pages.get(id)?;
        let (widgets, keys, name) = (next.widgets.clone(), next.keys.clone(), next.name.clone());

        if let Some(current) = self.pages.current
            && current != id
        {
            let old = self.pages.get(current)?.widgets.clone();
            for widget in old.into_iter().filter(|w| !widgets.contains(w)) {
                self.set_page_widget_visible(widget, false)?;
            }
        }
        for &widget in &widgets {
            self.set_page_widget_visible(widget, true)?;
        }
        self.pages.current = Some(id);
        self.set_fetch_keys(keys);
        tracing::info!(page = %name, "page shown");
        Ok(())
    }

    /// Cycle to the page registered after the current one.
    pub fn next_page(&mut self) -> Result<Option<PageId>, UiError> {
        if self.pages.is_empty() {
            return Ok(None);
        }
        let next = match self.pages.current {
            Some(PageId(index)) => PageId((index + 1) % self.pages.len()),
            None => PageId(0),
        };
        self.show_page(next)?;
        Ok(Some(next))
    }

    #[inline]
    pub const fn current_page(&self) -> Option<PageId> { self.pages.current }

    pub fn page_name(
        &self,
        id: PageId,
    ) -> Option<&str> {
        self.pages.get(id).ok().map(|page| page.name.as_str())
    }

    /// Run the current page's update hook.
    pub(crate) fn update_page(
        &mut self,
        snapshot: &Snapshot,
    ) {
        let Some(PageId(index)) = self.pages.current else {
            return;
        };
        let Some(mut hook) = self.pages.pages.get_mut(index).and_then(|page| page.update.take()) else {
            return;
        };
        hook(self, snapshot);
        // The hook may have torn the registry down
        if let Some(page) = self.pages.pages.get_mut(index)
            && page.update.is_none()
        {
            page.update = Some(hook);
        }
    }

    /// Push the current page's keys to the fetch bridge.
    pub(crate) fn sync_fetch_keys(&mut self) {
        let keys = self
            .pages
            .current
            .and_then(|id| self.pages.get(id).ok())
            .map(|page| page.keys.clone());
        if let Some(keys) = keys {
            self.set_fetch_keys(keys);
        }
    }

    fn set_page_widget_visible(
        &mut self,
        widget: WidgetId,
        visible: bool,
    ) -> Result<(), UiError> {
        if self.is_window(widget) {
            if visible {
                self.show_window(widget, false)?;
            } else {
                self.hide_window(widget);
                if let Some(node) = self.tree.get_mut(widget) {
                    node.visible = false;
                }
            }
        } else {
            self.set_visible(widget, visible);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use embedded_graphics::geometry::{Point, Size};
    use embedded_graphics::primitives::Rectangle;

    use super::*;
    use crate::config::AppConfig;
    use crate::fetch::{FetchBridge, FetchConfig};
    use crate::store::MemoryStore;
    use crate::widget::WidgetKind;
    use crate::widgets::Label;
    use crate::window::{Decorations, WindowOptions};

    fn rect(
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    ) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    fn label(
        app: &mut Application,
        text: &str,
    ) -> WidgetId {
        let root = app.root();
        app.add(root, rect(0, 0, 40, 10), WidgetKind::Label(Label::new(text))).unwrap()
    }

    fn visible(
        app: &Application,
        id: WidgetId,
    ) -> bool {
        app.widget(id).is_some_and(|node| node.is_visible())
    }

    // -------------------------------------------------------------------------
    // Registration and switching
    // -------------------------------------------------------------------------

    #[test]
    fn test_registered_widgets_start_hidden() {
        let mut app = Application::new(AppConfig::default());
        let speed = label(&mut app, "speed");
        let page = app.register_page("gps", vec![speed], vec![], |_, _| {}).unwrap();
        assert!(!visible(&app, speed));
        assert_eq!(app.current_page(), None);
        app.show_page(page).unwrap();
        assert!(visible(&app, speed));
        assert_eq!(app.page_name(page), Some("gps"));
    }

    #[test]
    fn test_register_unknown_widget_fails() {
        let mut app = Application::new(AppConfig::default());
        let gone = label(&mut app, "gone");
        app.destroy(gone);
        let result = app.register_page("bad", vec![gone], vec![], |_, _| {});
        assert!(matches!(result, Err(UiError::UnknownWidget(_))));
        assert!(matches!(app.show_page(PageId(3)), Err(UiError::UnknownPage(_))));
    }

    #[test]
    fn test_switch_hides_previous_page() {
        let mut app = Application::new(AppConfig::default());
        let speed = label(&mut app, "speed");
        let track = label(&mut app, "track");
        let gps = app.register_page("gps", vec![speed], vec![], |_, _| {}).unwrap();
        let music = app.register_page("music", vec![track], vec![], |_, _| {}).unwrap();

        app.show_page(gps).unwrap();
        app.show_page(music).unwrap();
        assert!(!visible(&app, speed));
        assert!(visible(&app, track));
        assert_eq!(app.current_page(), Some(music));
    }

    #[test]
    fn test_next_page_cycles() {
        let mut app = Application::new(AppConfig::default());
        assert_eq!(app.next_page().unwrap(), None, "no pages, nothing to show");
        let a = app.register_page("a", vec![], vec![], |_, _| {}).unwrap();
        let b = app.register_page("b", vec![], vec![], |_, _| {}).unwrap();
        assert_eq!(app.next_page().unwrap(), Some(a));
        assert_eq!(app.next_page().unwrap(), Some(b));
        assert_eq!(app.next_page().unwrap(), Some(a));
    }

    #[test]
    fn test_page_windows_use_window_stack() {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let window = app.window(root, rect(10, 10, 80, 60), &WindowOptions::titled("Trip", Decorations::NONE)).unwrap();
        let trip = app.register_page("trip", vec![window], vec![], |_, _| {}).unwrap();
        let other = app.register_page("other", vec![], vec![], |_, _| {}).unwrap();

        app.show_page(trip).unwrap();
        assert_eq!(app.window_stack(), &[window]);
        assert_eq!(app.active_window(), None, "page windows are not activated");
        app.show_page(other).unwrap();
        assert!(app.window_stack().is_empty());
        assert!(!visible(&app, window));
    }

    // -------------------------------------------------------------------------
    // Update hook and fetch keys
    // -------------------------------------------------------------------------

    #[test]
    fn test_update_runs_current_page_hook_only() {
        let mut app = Application::new(AppConfig::default());
        let speed = label(&mut app, "-");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (log_a, log_b) = (calls.clone(), calls.clone());
        let gps = app
            .register_page("gps", vec![speed], vec![], move |app: &mut Application, snapshot: &Snapshot| {
                log_a.borrow_mut().push("gps");
                let text = snapshot.get("GPS.Speed").unwrap_or("--").to_owned();
                app.set_text(speed, &text).unwrap();
            })
            .unwrap();
        app.register_page("music", vec![], vec![], move |_, _| log_b.borrow_mut().push("music"))
            .unwrap();

        app.update().unwrap();
        assert!(calls.borrow().is_empty(), "no current page yet");
        app.show_page(gps).unwrap();
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(*calls.borrow(), vec!["gps", "gps"]);
        let Some(WidgetKind::Label(text)) = app.widget(speed).map(|n| n.kind()) else {
            panic!("not a label");
        };
        assert_eq!(text.text, "--", "absent value rendered as placeholder");
    }

    #[test]
    fn test_show_page_replaces_fetch_keys() {
        let store = MemoryStore::new();
        store.set("GPS.Speed", "88", None);
        store.set("Media.Title", "Intro", None);
        let config = FetchConfig { period: Duration::from_millis(5), ..FetchConfig::default() };
        let bridge = FetchBridge::spawn(store, vec![], config).unwrap();

        let mut app = Application::new(AppConfig::default());
        app.attach_fetch(bridge);
        let gps = app.register_page("gps", vec![], vec!["GPS.Speed".into()], |_, _| {}).unwrap();
        let music = app.register_page("music", vec![], vec!["Media.Title".into()], |_, _| {}).unwrap();

        app.show_page(gps).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while app.snapshot().get("GPS.Speed").is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            app.update().unwrap();
        }
        assert_eq!(app.snapshot().get("GPS.Speed"), Some("88"));

        app.show_page(music).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while app.snapshot().get("Media.Title").is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            app.update().unwrap();
        }
        assert_eq!(app.snapshot().get("Media.Title"), Some("Intro"));
        assert!(!app.snapshot().contains_key("GPS.Speed"), "old page keys no longer polled");
    }
}
