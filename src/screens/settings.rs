//! Settings windows.
//!
//! The Settings tab opens a category window; each category opens its own
//! window owned by it, so closing Settings closes everything below it.
//!
//! - Network: interface addresses in a scrolled list
//! - Power: modal shutdown/reboot confirmation that publishes a request
//! - System: frame timing from the application's metrics, refreshed by a timer

use core::fmt::Write;
use std::rc::Rc;
use std::time::Duration;

use dashboard_ui::container::Orientation;
use dashboard_ui::style::{StyleKey, StyleValue};
use dashboard_ui::widgets::{Button, Label};
use dashboard_ui::window::{Decoration, Decorations, WindowOptions};
use dashboard_ui::{Application, Event, MemoryStore, RequestSink, Snapshot, Trigger, UiError, WidgetId, WidgetKind};
use embedded_graphics::mono_font::ascii::FONT_9X15_BOLD;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;

use super::report;
use crate::keys;

const NETWORK_REFRESH: Duration = Duration::from_secs(1);
const SYSTEM_REFRESH: Duration = Duration::from_millis(500);
const ROW_HEIGHT: i32 = 18;

fn rect(
    x: i32,
    y: i32,
    w: u32,
    h: u32,
) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

fn button(
    app: &mut Application,
    parent: WidgetId,
    area: Rectangle,
    text: &str,
    handler: impl Fn(&mut Application, WidgetId, &Event) + 'static,
) -> Result<WidgetId, UiError> {
    let id = app.add_styled(
        parent,
        area,
        WidgetKind::Button(Button::new(text)),
        &[(StyleKey::Font, StyleValue::font(&FONT_9X15_BOLD))],
    )?;
    app.bind(id, Trigger::Click, handler)?;
    Ok(id)
}

/// Run `refresh` every `interval` for as long as `alive` exists.
fn schedule_refresh<F>(
    app: &mut Application,
    interval: Duration,
    alive: WidgetId,
    refresh: Rc<F>,
) where
    F: Fn(&mut Application) -> Result<(), UiError> + 'static,
{
    app.after(interval, move |app: &mut Application| {
        if !app.contains(alive) {
            return;
        }
        report(refresh(app), "refresh settings view");
        schedule_refresh(app, interval, alive, refresh);
    });
}

// =============================================================================
// Category Window
// =============================================================================

/// Open the settings window and return it.
pub fn open(
    app: &mut Application,
    requests: &MemoryStore,
) -> Result<WidgetId, UiError> {
    let root = app.root();
    let options = WindowOptions::titled("Settings", Decorations::CLOSE).restricted();
    let window = app.window(root, rect(0, 20, 320, 185), &options)?;

    button(app, window, rect(8, 8, 148, 44), "Network", move |app: &mut Application, _: WidgetId, _: &Event| {
        report(open_network(app, window), "open network settings");
    })?;
    let requests = requests.clone();
    button(app, window, rect(164, 8, 148, 44), "Power", move |app: &mut Application, _: WidgetId, _: &Event| {
        report(open_power(app, window, &requests), "open power settings");
    })?;
    button(app, window, rect(8, 60, 148, 44), "System", move |app: &mut Application, _: WidgetId, _: &Event| {
        report(open_system(app, window), "open system info");
    })?;
    button(app, window, rect(164, 60, 148, 44), "< Back", move |app: &mut Application, _: WidgetId, _: &Event| {
        app.destroy(window);
    })?;

    app.show_window(window, true)?;
    tracing::debug!(?window, "settings opened");
    Ok(window)
}

// =============================================================================
// Network
// =============================================================================

/// Interface name, then `(prefix, key)` rows.
const INTERFACES: [(&str, &[(&str, &str)]); 3] = [
    ("eth0", &[("IP     ", keys::NET_ETH0_IP)]),
    (
        "wlan0",
        &[("IP     ", keys::NET_WLAN0_IP), ("SSID   ", keys::NET_WLAN0_SSID), ("Signal ", keys::NET_WLAN0_STRENGTH)],
    ),
    (
        "wlan1",
        &[("IP     ", keys::NET_WLAN1_IP), ("SSID   ", keys::NET_WLAN1_SSID), ("Signal ", keys::NET_WLAN1_STRENGTH)],
    ),
];

fn open_network(
    app: &mut Application,
    owner: WidgetId,
) -> Result<(), UiError> {
    let options = WindowOptions::titled("Network", Decorations::CLOSE).restricted();
    let window = app.window(owner, rect(20, 30, 280, 170), &options)?;
    let list = app.add(window, rect(4, 4, 252, 140), WidgetKind::Panel)?;
    let bar = app.scrollbar(window, rect(258, 4, 16, 140), Orientation::Vertical)?;
    app.attach_scrollbar(bar, list)?;

    let mut rows = Vec::new();
    let mut y = 2;
    for (name, fields) in INTERFACES {
        app.add_styled(
            list,
            rect(4, y, 240, 14),
            WidgetKind::Label(Label::new(name)),
            &[(StyleKey::Font, StyleValue::font(&FONT_9X15_BOLD))],
        )?;
        y += ROW_HEIGHT;
        for &(prefix, key) in fields {
            let row = app.add(list, rect(12, y, 232, 14), WidgetKind::Label(Label::new(prefix)))?;
            rows.push((row, prefix, key));
            y += ROW_HEIGHT;
        }
    }

    let refresh = Rc::new(move |app: &mut Application| {
        for &(row, prefix, key) in &rows {
            let text = format!("{prefix}{}", app.snapshot().get(key).unwrap_or("-"));
            app.set_text(row, &text)?;
        }
        let title = network_title(app.snapshot());
        app.set_title(window, &title);
        Ok(())
    });
    refresh(app)?;
    schedule_refresh(app, NETWORK_REFRESH, list, refresh);

    app.show_window(window, true)
}

/// "Network 2/3 up": interfaces that currently report an address.
fn network_title(snapshot: &Snapshot) -> String<24> {
    let up = INTERFACES
        .iter()
        .filter(|(_, fields)| fields.first().is_some_and(|&(_, key)| snapshot.get(key).is_some()))
        .count();
    let mut title = String::new();
    write!(title, "Network {up}/{} up", INTERFACES.len()).ok();
    title
}

// =============================================================================
// Power
// =============================================================================

fn open_power(
    app: &mut Application,
    owner: WidgetId,
    requests: &MemoryStore,
) -> Result<(), UiError> {
    let options = WindowOptions::titled("Power", Decorations::CLOSE).modal().restricted();
    let window = app.window(owner, rect(60, 50, 200, 110), &options)?;

    for (x, text, request) in [(8, "Shut down", keys::REQ_POWER_OFF), (104, "Reboot", keys::REQ_POWER_REBOOT)] {
        let sink = requests.clone();
        button(app, window, rect(x, 8, 88, 36), text, move |app: &mut Application, _: WidgetId, _: &Event| {
            tracing::info!(request, "power request confirmed");
            if let Err(err) = sink.clone().publish_request(request, &[]) {
                tracing::warn!(request, error = %err, "failed to publish power request");
            }
            app.destroy(window);
        })?;
    }
    button(app, window, rect(56, 50, 88, 30), "Cancel", move |app: &mut Application, _: WidgetId, _: &Event| {
        app.destroy(window);
    })?;

    app.show_window(window, true)
}

// =============================================================================
// System
// =============================================================================

const SYSTEM_LINES: usize = 7;

fn open_system(
    app: &mut Application,
    owner: WidgetId,
) -> Result<(), UiError> {
    let options = WindowOptions::titled("System", Decorations::CLOSE | Decorations::HELP).restricted();
    let window = app.window(owner, rect(40, 30, 240, 140), &options)?;

    let mut lines = Vec::with_capacity(SYSTEM_LINES);
    for i in 0..SYSTEM_LINES {
        let y = 4 + i as i32 * 14;
        lines.push(app.add(window, rect(6, y, 228, 12), WidgetKind::Label(Label::new("")))?);
    }

    if let Some(help) = app.decoration(window, Decoration::Help) {
        let popup = app.popup(window)?;
        for text in ["Y: next page", "Right click: menu", "Wheel: scroll lists"] {
            app.popup_item(popup, text, |_: &mut Application, _: WidgetId, _: &Event| {})?;
        }
        app.bind(help, Trigger::Click, move |app: &mut Application, help: WidgetId, _: &Event| {
            let anchor = app.absolute_rect(help).top_left;
            report(app.show_popup(popup, anchor), "show system help");
        })?;
    }

    let refresh = Rc::new(move |app: &mut Application| {
        let text = system_lines(app);
        for (&line, value) in lines.iter().zip(&text) {
            app.set_text(line, value)?;
        }
        Ok(())
    });
    refresh(app)?;
    schedule_refresh(app, SYSTEM_REFRESH, window, refresh);

    app.show_window(window, true)
}

fn system_lines(app: &Application) -> [String<40>; SYSTEM_LINES] {
    let metrics = app.metrics();
    let ms = |us: u32| us as f32 / 1000.0;
    let mut lines: [String<40>; SYSTEM_LINES] = Default::default();

    write!(lines[0], "FPS     {:.1}", metrics.fps()).ok();
    write!(lines[1], "Frame   {:.1}ms", ms(metrics.frame_time_avg_us())).ok();
    if metrics.total_frames > 0 {
        write!(
            lines[2],
            "Min/Max {:.1}/{:.1}ms",
            ms(metrics.frame_time_min_us),
            ms(metrics.frame_time_max_us)
        )
        .ok();
    } else {
        lines[2].push_str("Min/Max -").ok();
    }
    write!(lines[3], "Render  {:.1}ms", ms(metrics.render_time_us)).ok();
    write!(lines[4], "Frames  {}", metrics.total_frames).ok();
    write!(lines[5], "Uptime  {}", metrics.uptime_string()).ok();
    write!(lines[6], "Widgets {}", app.tree().len()).ok();
    lines
}

#[cfg(test)]
mod tests {
    use dashboard_ui::{AppConfig, MouseButton};

    use super::*;

    fn click_at(
        app: &mut Application,
        pos: Point,
    ) {
        app.dispatch(Event::ButtonDown { pos, button: MouseButton::Left });
        app.dispatch(Event::ButtonUp { pos, button: MouseButton::Left });
    }

    fn click(
        app: &mut Application,
        id: WidgetId,
    ) {
        let center = app.absolute_rect(id).center();
        click_at(app, center);
    }

    fn find_button(
        app: &Application,
        parent: WidgetId,
        text: &str,
    ) -> WidgetId {
        app.widget(parent)
            .expect("parent exists")
            .children()
            .iter()
            .copied()
            .find(|&id| matches!(app.widget(id).map(|n| n.kind()), Some(WidgetKind::Button(b)) if b.text == text))
            .expect("button exists")
    }

    #[test]
    fn test_open_and_back() {
        let mut app = Application::new(AppConfig::default());
        let window = open(&mut app, &MemoryStore::new()).unwrap();
        assert_eq!(app.active_window(), Some(window));

        let back = find_button(&app, window, "< Back");
        click(&mut app, back);
        assert!(!app.contains(window), "back closes the settings window");
        assert!(app.window_stack().is_empty());
    }

    #[test]
    fn test_power_window_is_modal_and_publishes() {
        let store = MemoryStore::new();
        let mut app = Application::new(AppConfig::default());
        let settings = open(&mut app, &store).unwrap();
        click(&mut app, find_button(&app, settings, "Power"));

        let power = app.active_window().expect("power window active");
        assert_ne!(power, settings);
        assert!(app.is_modal(power));

        // Clicks outside the modal window are swallowed
        let network = find_button(&app, settings, "Network");
        let behind = app.absolute_rect(network).top_left + Point::new(8, 8);
        click_at(&mut app, behind);
        assert_eq!(app.window_stack().len(), 2, "no network window behind the modal one");
        assert_eq!(app.active_window(), Some(power));

        click(&mut app, find_button(&app, power, "Reboot"));
        assert!(!app.contains(power));
        assert!(store.take_request(keys::REQ_POWER_REBOOT).is_some());
        assert!(store.take_request(keys::REQ_POWER_OFF).is_none());
    }

    #[test]
    fn test_network_list_scrolls() {
        let mut app = Application::new(AppConfig::default());
        let settings = open(&mut app, &MemoryStore::new()).unwrap();
        click(&mut app, find_button(&app, settings, "Network"));

        let network = app.active_window().expect("network window active");
        let bar = app
            .widget(network)
            .expect("window exists")
            .children()
            .iter()
            .copied()
            .find(|&id| matches!(app.widget(id).map(|n| n.kind()), Some(WidgetKind::Scrollbar(_))))
            .expect("scrollbar exists");
        let (low, high) = app.bar(bar).expect("bar range");
        assert_eq!(low, 0.0);
        assert!(high < 1.0, "list is taller than its view");
    }

    #[test]
    fn test_network_title_counts_interfaces_up() {
        let snapshot: Snapshot = [(keys::NET_ETH0_IP, Some("10.0.0.2".to_owned())), (keys::NET_WLAN0_IP, None)]
            .into_iter()
            .collect();
        assert_eq!(network_title(&snapshot).as_str(), "Network 1/3 up");
        assert_eq!(network_title(&Snapshot::default()).as_str(), "Network 0/3 up");
    }

    #[test]
    fn test_system_lines() {
        let mut app = Application::new(AppConfig::default());
        let lines = system_lines(&app);
        assert_eq!(lines[2].as_str(), "Min/Max -", "no frames recorded yet");
        assert!(lines[6].starts_with("Widgets "));
        let settings = open(&mut app, &MemoryStore::new()).unwrap();
        click(&mut app, find_button(&app, settings, "System"));
        assert_ne!(app.active_window(), Some(settings));
    }
}
