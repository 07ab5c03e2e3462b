//! Dashboard screens built on the toolkit.
//!
//! # Pages
//!
//! - **GPS** ([`gps`]): speed readout and speed history
//! - **Music** ([`music`]): track info and player controls
//!
//! The status bar ([`status`]) and the tab bar stay on screen for every page.
//! Settings ([`settings`]) are windows opened from the Settings tab rather than
//! a page of their own.
//!
//! # Controls
//!
//! | Input | Action |
//! |-------|--------|
//! | Tabs | Switch page / open settings |
//! | `Y` | Next page |
//! | Right click | Page menu |
//! | `Esc` | Exit (fullscreen only) |

mod gps;
mod icons;
mod music;
mod settings;
mod status;

use std::cell::Cell;
use std::fmt::Display;
use std::rc::Rc;

use dashboard_ui::event::Key;
use dashboard_ui::{Application, Event, MemoryStore, MouseButton, PageId, Trigger, UiError, WidgetId, WidgetState};

pub use icons::{ICON_SIZE, install as install_icons};

/// Handles the host needs after building the screens.
pub struct Dashboard {
    pub gps: PageId,
    pub music: PageId,
}

/// Log a failed UI operation from inside a handler or hook.
fn report<T, E: Display>(
    result: Result<T, E>,
    action: &str,
) {
    if let Err(err) = result {
        tracing::warn!(action, error = %err, "ui action failed");
    }
}

/// Build every screen and wire navigation. `requests` receives the commands
/// published by the controls.
pub fn build(
    app: &mut Application,
    requests: &MemoryStore,
) -> Result<Dashboard, UiError> {
    let bar = status::build_status(app)?;
    let tabs = status::build_tabs(app)?;
    let gps = gps::register(app)?;
    let music = music::register(app, requests)?;

    for (tab, page) in [(tabs.gps, gps), (tabs.music, music)] {
        app.bind(tab, Trigger::Click, move |app: &mut Application, _: WidgetId, _: &Event| {
            report(app.show_page(page), "switch page");
        })?;
    }

    let settings_window = Rc::new(Cell::new(None));
    let open_settings = {
        let requests = requests.clone();
        move |app: &mut Application| {
            // One settings window at a time
            if let Some(window) = settings_window.get().filter(|&w| app.contains(w)) {
                app.raise(window);
                app.set_active_window(Some(window));
                return;
            }
            match settings::open(app, &requests) {
                Ok(window) => settings_window.set(Some(window)),
                Err(err) => tracing::warn!(error = %err, "failed to open settings"),
            }
        }
    };
    let open_settings = Rc::new(open_settings);

    let open = Rc::clone(&open_settings);
    app.bind(tabs.settings, Trigger::Click, move |app: &mut Application, _: WidgetId, _: &Event| open(app))?;

    build_menu(app, gps, music, open_settings)?;

    let root = app.root();
    app.bind(root, Trigger::KeyDown(Key::Char('y')), |app: &mut Application, _: WidgetId, _: &Event| {
        report(app.next_page(), "cycle page");
    })?;

    // The current page's tab is disabled, which also makes it ignore clicks
    app.on_update(move |app, snapshot| {
        report(bar.update(app, snapshot), "update status bar");
        let current = app.current_page();
        for (tab, page) in [(tabs.gps, gps), (tabs.music, music)] {
            let state = if current == Some(page) { WidgetState::Disabled } else { WidgetState::Enabled };
            app.set_state(tab, state);
        }
    });

    Ok(Dashboard { gps, music })
}

/// Right-click menu on the background.
fn build_menu(
    app: &mut Application,
    gps: PageId,
    music: PageId,
    open_settings: Rc<impl Fn(&mut Application) + 'static>,
) -> Result<(), UiError> {
    let root = app.root();
    let menu = app.popup(root)?;
    let pages = app.popup(root)?;
    for (name, page) in [("GPS", gps), ("Music", music)] {
        app.popup_item(pages, name, move |app: &mut Application, _: WidgetId, _: &Event| {
            report(app.show_page(page), "switch page");
        })?;
    }
    app.popup_submenu(menu, "Pages", pages)?;
    app.popup_item(menu, "Settings", move |app: &mut Application, _: WidgetId, _: &Event| open_settings(app))?;
    app.popup_separator(menu)?;
    app.popup_item(menu, "Quit", |app: &mut Application, _: WidgetId, _: &Event| app.exit())?;

    app.bind(root, Trigger::ButtonDown(MouseButton::Right), move |app: &mut Application, _: WidgetId, event: &Event| {
        if let Some(pos) = event.pos() {
            report(app.show_popup(menu, pos), "open menu");
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use dashboard_ui::AppConfig;
    use embedded_graphics::prelude::Point;

    use super::*;

    fn click(
        app: &mut Application,
        pos: Point,
    ) {
        app.dispatch(Event::ButtonDown { pos, button: MouseButton::Left });
        app.dispatch(Event::ButtonUp { pos, button: MouseButton::Left });
    }

    fn built() -> (Application, Dashboard) {
        let mut app = Application::new(AppConfig::default());
        install_icons(app.assets_mut()).unwrap();
        let dashboard = build(&mut app, &MemoryStore::new()).unwrap();
        app.show_page(dashboard.gps).unwrap();
        app.update().unwrap();
        (app, dashboard)
    }

    #[test]
    fn test_tabs_switch_pages() {
        let (mut app, dashboard) = built();
        click(&mut app, Point::new(160, 220));
        assert_eq!(app.current_page(), Some(dashboard.music));
        app.update().unwrap();
        click(&mut app, Point::new(50, 220));
        assert_eq!(app.current_page(), Some(dashboard.gps));
    }

    #[test]
    fn test_settings_tab_opens_one_window() {
        let (mut app, _) = built();
        click(&mut app, Point::new(260, 220));
        assert_eq!(app.window_stack().len(), 1);
        click(&mut app, Point::new(260, 220));
        assert_eq!(app.window_stack().len(), 1, "second click reuses the open window");
    }

    #[test]
    fn test_y_key_cycles_pages() {
        let (mut app, dashboard) = built();
        app.dispatch(Event::KeyDown { key: Key::Char('y') });
        assert_eq!(app.current_page(), Some(dashboard.music));
        app.dispatch(Event::KeyDown { key: Key::Char('y') });
        assert_eq!(app.current_page(), Some(dashboard.gps));
    }

    #[test]
    fn test_right_click_menu() {
        let (mut app, _) = built();
        let pos = Point::new(5, 100);
        app.dispatch(Event::ButtonDown { pos, button: MouseButton::Right });
        assert_eq!(app.popup_stack().len(), 1, "menu open");
        app.dispatch(Event::KeyDown { key: Key::Escape });
        assert!(app.popup_stack().is_empty());
    }
}
