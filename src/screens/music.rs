//! Music page: current track, play position and player controls.
//!
//! The control buttons publish requests for the media daemon; the page itself
//! only ever reflects what the daemon reports back through the store.

use core::fmt::Write;

use dashboard_ui::style::{StyleKey, StyleValue};
use dashboard_ui::text::Align;
use dashboard_ui::widgets::{Button, Label, ProgressBar};
use dashboard_ui::{Application, Event, MemoryStore, PageId, RequestSink, Snapshot, Trigger, UiError, WidgetId, WidgetKind};
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;
use profont::PROFONT_18_POINT;

use super::report;
use crate::keys;

const PLAYER_OFFLINE: &str = "[Music Player not running]";
const NO_TIME: &str = "--:--/--:--";
const PLAY: &str = ">";
const PAUSE: &str = "||";

struct MusicPage {
    title: WidgetId,
    artist: WidgetId,
    album: WidgetId,
    time: WidgetId,
    progress: WidgetId,
    play: WidgetId,
}

pub fn register(
    app: &mut Application,
    requests: &MemoryStore,
) -> Result<PageId, UiError> {
    let root = app.root();
    let rect = |x: i32, y: i32, w: u32, h: u32| Rectangle::new(Point::new(x, y), Size::new(w, h));

    let title = app.add_styled(
        root,
        rect(10, 28, 300, 24),
        WidgetKind::Label(Label::new(PLAYER_OFFLINE)),
        &[(StyleKey::Font, StyleValue::font(&PROFONT_18_POINT))],
    )?;
    let artist = app.add(root, rect(10, 56, 300, 14), WidgetKind::Label(Label::new("")))?;
    let album = app.add(root, rect(10, 74, 300, 14), WidgetKind::Label(Label::new("")))?;
    let time = app.add(root, rect(10, 100, 300, 14), WidgetKind::Label(Label::new(NO_TIME).align(Align::Center)))?;
    let progress = app.add(root, rect(10, 120, 300, 12), WidgetKind::ProgressBar(ProgressBar::new(0.0, 100.0)))?;

    let controls = [
        (40, "|<", keys::REQ_MEDIA_PREV),
        (130, PLAY, keys::REQ_MEDIA_PAUSE),
        (220, ">|", keys::REQ_MEDIA_NEXT),
    ];
    let mut buttons = Vec::with_capacity(controls.len());
    for (x, text, request) in controls {
        let button = app.add_styled(
            root,
            rect(x, 145, 60, 44),
            WidgetKind::Button(Button::new(text)),
            &[(StyleKey::Font, StyleValue::font(&FONT_10X20))],
        )?;
        let sink = requests.clone();
        app.bind(button, Trigger::Click, move |_: &mut Application, _: WidgetId, _: &Event| {
            let mut sink = sink.clone();
            if let Err(err) = sink.publish_request(request, &[]) {
                tracing::warn!(request, error = %err, "failed to publish media request");
            }
        })?;
        buttons.push(button);
    }

    let page = MusicPage { title, artist, album, time, progress, play: buttons[1] };
    let mut widgets = vec![title, artist, album, time, progress];
    widgets.extend(buttons);
    app.register_page(
        "Music",
        widgets,
        keys::page_keys(&[
            keys::MEDIA_ALIVE,
            keys::MEDIA_STATE,
            keys::MEDIA_TITLE,
            keys::MEDIA_ARTIST,
            keys::MEDIA_ALBUM,
            keys::MEDIA_TIME,
        ]),
        move |app: &mut Application, snapshot: &Snapshot| report(page.update(app, snapshot), "update music page"),
    )
}

impl MusicPage {
    fn update(
        &self,
        app: &mut Application,
        snapshot: &Snapshot,
    ) -> Result<(), UiError> {
        if snapshot.get(keys::MEDIA_ALIVE).is_none() {
            app.set_text(self.title, PLAYER_OFFLINE)?;
            app.set_text(self.artist, "")?;
            app.set_text(self.album, "")?;
            app.set_text(self.time, NO_TIME)?;
            app.set_progress(self.progress, 0.0)?;
            return app.set_text(self.play, PLAY);
        }

        app.set_text(self.title, snapshot.get(keys::MEDIA_TITLE).unwrap_or(""))?;
        app.set_text(self.artist, snapshot.get(keys::MEDIA_ARTIST).unwrap_or(""))?;
        app.set_text(self.album, snapshot.get(keys::MEDIA_ALBUM).unwrap_or(""))?;

        let playing = snapshot.get(keys::MEDIA_STATE) == Some("play");
        app.set_text(self.play, if playing { PAUSE } else { PLAY })?;

        match snapshot.get(keys::MEDIA_TIME).and_then(parse_time) {
            Some((elapsed, total)) => {
                app.set_text(self.time, &time_text(elapsed, total))?;
                let percent = if total == 0 { 0.0 } else { elapsed as f32 * 100.0 / total as f32 };
                app.set_progress(self.progress, percent)
            }
            None => {
                app.set_text(self.time, NO_TIME)?;
                app.set_progress(self.progress, 0.0)
            }
        }
    }
}

/// Parse `elapsed:total` seconds.
fn parse_time(value: &str) -> Option<(u32, u32)> {
    let (elapsed, total) = value.split_once(':')?;
    Some((elapsed.trim().parse().ok()?, total.trim().parse().ok()?))
}

/// `m:ss/m:ss`.
fn time_text(
    elapsed: u32,
    total: u32,
) -> String<24> {
    let mut out = String::new();
    write!(out, "{}:{:02}/{}:{:02}", elapsed / 60, elapsed % 60, total / 60, total % 60).ok();
    out
}

#[cfg(test)]
mod tests {
    use dashboard_ui::AppConfig;
    use dashboard_ui::event::MouseButton;

    use super::*;

    fn text(
        app: &Application,
        id: WidgetId,
    ) -> std::string::String {
        match app.widget(id).map(|n| n.kind()) {
            Some(WidgetKind::Label(label)) => label.text.clone(),
            Some(WidgetKind::Button(button)) => button.text.clone(),
            _ => panic!("no text"),
        }
    }

    fn snapshot(values: &[(&str, Option<&str>)]) -> Snapshot {
        values.iter().map(|&(key, value)| (key, value.map(str::to_owned))).collect()
    }

    fn page(app: &mut Application) -> MusicPage {
        let root = app.root();
        let mut label = || app.add(root, Rectangle::zero(), WidgetKind::Label(Label::new(""))).unwrap();
        let (title, artist, album, time) = (label(), label(), label(), label());
        let progress = app
            .add(root, Rectangle::zero(), WidgetKind::ProgressBar(ProgressBar::new(0.0, 100.0)))
            .unwrap();
        let play = app.add(root, Rectangle::zero(), WidgetKind::Button(Button::new(PLAY))).unwrap();
        MusicPage { title, artist, album, time, progress, play }
    }

    #[test]
    fn test_parse_and_format_time() {
        assert_eq!(parse_time("65:383"), Some((65, 383)));
        assert_eq!(parse_time("65"), None);
        assert_eq!(parse_time("a:b"), None);
        assert_eq!(time_text(65, 383).as_str(), "1:05/6:23");
    }

    #[test]
    fn test_player_offline() {
        let mut app = Application::new(AppConfig::default());
        let page = page(&mut app);
        page.update(&mut app, &snapshot(&[(keys::MEDIA_ALIVE, None), (keys::MEDIA_TITLE, Some("stale"))]))
            .unwrap();
        assert_eq!(text(&app, page.title), PLAYER_OFFLINE);
        assert_eq!(text(&app, page.time), NO_TIME);
    }

    #[test]
    fn test_playing_track() {
        let mut app = Application::new(AppConfig::default());
        let page = page(&mut app);
        page.update(
            &mut app,
            &snapshot(&[
                (keys::MEDIA_ALIVE, Some("1")),
                (keys::MEDIA_STATE, Some("play")),
                (keys::MEDIA_TITLE, Some("Radar Love")),
                (keys::MEDIA_TIME, Some("60:240")),
            ]),
        )
        .unwrap();
        assert_eq!(text(&app, page.title), "Radar Love");
        assert_eq!(text(&app, page.play), PAUSE, "playing shows the pause symbol");
        assert_eq!(text(&app, page.time), "1:00/4:00");
        let Some(WidgetKind::ProgressBar(bar)) = app.widget(page.progress).map(|n| n.kind()) else {
            panic!("not a progress bar");
        };
        assert_eq!(bar.value(), 25.0);
    }

    #[test]
    fn test_buttons_publish_requests() {
        let store = MemoryStore::new();
        let mut app = Application::new(AppConfig::default());
        register(&mut app, &store).unwrap();
        let page = app.next_page().unwrap().expect("page registered");
        assert_eq!(app.page_name(page), Some("Music"));

        // Next button centre
        let pos = Point::new(250, 167);
        app.dispatch(Event::ButtonDown { pos, button: MouseButton::Left });
        app.dispatch(Event::ButtonUp { pos, button: MouseButton::Left });
        assert!(store.take_request(keys::REQ_MEDIA_NEXT).is_some(), "click published the request");
        assert!(store.take_request(keys::REQ_MEDIA_PREV).is_none());
        assert!(store.take_request(keys::REQ_MEDIA_NEXT).is_none(), "consumed once");
    }
}
