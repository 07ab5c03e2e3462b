//! Status bar and tab bar, present on every page.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ [eth][wlan0][wlan1]   GPS      12:34   │  20px
//! ├────────────────────────────────────────┤
//! │                 page                   │
//! ├─────────────┬─────────────┬────────────┤
//! │     GPS     │    Music    │  Settings  │  35px
//! └─────────────┴─────────────┴────────────┘
//! ```

use core::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use dashboard_ui::colors::{GRAY, WHITE};
use dashboard_ui::style::{StyleKey, StyleValue};
use dashboard_ui::text::Align;
use dashboard_ui::widgets::{Button, ImageView, Label};
use dashboard_ui::{Application, Snapshot, UiError, WidgetId, WidgetKind};
use embedded_graphics::mono_font::ascii::FONT_9X15_BOLD;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;

use super::icons::{self, ICON_SIZE};
use crate::keys;

/// Top of the tab bar.
pub const TAB_Y: i32 = 205;
pub const TAB_HEIGHT: u32 = 35;
pub const STATUS_HEIGHT: u32 = 20;

pub struct StatusBar {
    eth: WidgetId,
    wlan0: WidgetId,
    wlan1: WidgetId,
    gps: WidgetId,
    clock: WidgetId,
}

/// Tab buttons, left to right.
pub struct Tabs {
    pub gps: WidgetId,
    pub music: WidgetId,
    pub settings: WidgetId,
}

pub fn build_status(app: &mut Application) -> Result<StatusBar, UiError> {
    let root = app.root();
    let icon = |x: i32| Rectangle::new(Point::new(x, 2), Size::new(ICON_SIZE, ICON_SIZE));
    let eth = app.add(root, icon(4), WidgetKind::Image(ImageView::new(icons::ETH_DOWN)))?;
    let wlan0 = app.add(root, icon(24), WidgetKind::Image(ImageView::new(icons::WIFI_OFF)))?;
    let wlan1 = app.add(root, icon(44), WidgetKind::Image(ImageView::new(icons::WIFI_OFF)))?;
    let gps = app.add(
        root,
        Rectangle::new(Point::new(110, 4), Size::new(100, 12)),
        WidgetKind::Label(Label::new("").align(Align::Center)),
    )?;
    let clock = app.add(
        root,
        Rectangle::new(Point::new(256, 4), Size::new(60, 12)),
        WidgetKind::Label(Label::new("--:--").align(Align::Right)),
    )?;
    Ok(StatusBar { eth, wlan0, wlan1, gps, clock })
}

pub fn build_tabs(app: &mut Application) -> Result<Tabs, UiError> {
    let root = app.root();
    // The current page's tab is disabled, so the disabled color is the highlight
    let style = [
        (StyleKey::TextColor, StyleValue::Color(GRAY)),
        (StyleKey::TextDisabled, StyleValue::Color(WHITE)),
        (StyleKey::Font, StyleValue::font(&FONT_9X15_BOLD)),
    ];
    let mut tab = |x: i32, width: u32, text: &str| {
        app.add_styled(
            root,
            Rectangle::new(Point::new(x, TAB_Y), Size::new(width, TAB_HEIGHT)),
            WidgetKind::Button(Button::new(text)),
            &style,
        )
    };
    Ok(Tabs {
        gps: tab(0, 106, "GPS")?,
        music: tab(107, 106, "Music")?,
        settings: tab(214, 106, "Settings")?,
    })
}

impl StatusBar {
    pub fn update(
        &self,
        app: &mut Application,
        snapshot: &Snapshot,
    ) -> Result<(), UiError> {
        let eth = if snapshot.get(keys::NET_ETH0_IP).is_some() { icons::ETH_UP } else { icons::ETH_DOWN };
        app.set_image(self.eth, eth)?;
        app.set_image(self.wlan0, icons::wifi_icon(snapshot.parse(keys::NET_WLAN0_STRENGTH)))?;
        app.set_image(self.wlan1, icons::wifi_icon(snapshot.parse(keys::NET_WLAN1_STRENGTH)))?;
        app.set_text(self.gps, fix_text(snapshot.parse(keys::GPS_FIX)))?;

        let secs = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        app.set_text(self.clock, &clock_text(secs))
    }
}

/// Short GPS fix description for the status bar.
const fn fix_text(mode: Option<u8>) -> &'static str {
    match mode {
        Some(3) => "GPS 3D",
        Some(2) => "GPS 2D",
        Some(_) => "GPS no fix",
        None => "",
    }
}

/// `HH:MM` (UTC) of a Unix timestamp.
fn clock_text(unix_secs: u64) -> String<8> {
    let day_secs = unix_secs % 86_400;
    let mut out = String::new();
    write!(out, "{:02}:{:02}", day_secs / 3600, (day_secs % 3600) / 60).ok();
    out
}

#[cfg(test)]
mod tests {
    use dashboard_ui::AppConfig;

    use super::*;

    #[test]
    fn test_clock_text() {
        assert_eq!(clock_text(0).as_str(), "00:00");
        assert_eq!(clock_text(86_400 + 13 * 3600 + 7 * 60 + 59).as_str(), "13:07");
    }

    #[test]
    fn test_fix_text() {
        assert_eq!(fix_text(Some(3)), "GPS 3D");
        assert_eq!(fix_text(Some(1)), "GPS no fix");
        assert_eq!(fix_text(None), "", "no GPS daemon, nothing shown");
    }

    #[test]
    fn test_status_icons_follow_snapshot() {
        let mut app = Application::new(AppConfig::default());
        let bar = build_status(&mut app).unwrap();
        let snapshot: Snapshot = [
            (keys::NET_ETH0_IP, Some("192.168.8.2".to_owned())),
            (keys::NET_WLAN0_STRENGTH, Some("80".to_owned())),
            (keys::NET_WLAN1_STRENGTH, None),
        ]
        .into_iter()
        .collect();
        bar.update(&mut app, &snapshot).unwrap();

        let image = |id| match app.widget(id).map(|n| n.kind()) {
            Some(WidgetKind::Image(image)) => image.key.clone(),
            _ => panic!("not an image"),
        };
        assert_eq!(image(bar.eth), icons::ETH_UP);
        assert_eq!(image(bar.wlan0), icons::WIFI_LEVELS[3]);
        assert_eq!(image(bar.wlan1), icons::WIFI_OFF);
    }
}
