//! GPS page: current speed and a speed history graph.

use core::fmt::Write;

use dashboard_ui::style::{StyleKey, StyleValue};
use dashboard_ui::text::Align;
use dashboard_ui::widgets::{Graph, Label};
use dashboard_ui::{Application, PageId, Snapshot, UiError, WidgetId, WidgetKind};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;
use profont::{PROFONT_18_POINT, PROFONT_24_POINT};

use super::report;
use crate::keys;

/// Shown while no speed is known.
const NO_SPEED: &str = "---";

struct GpsPage {
    speed: WidgetId,
    graph: WidgetId,
}

pub fn register(app: &mut Application) -> Result<PageId, UiError> {
    let root = app.root();
    let speed = app.add_styled(
        root,
        Rectangle::new(Point::new(40, 40), Size::new(150, 40)),
        WidgetKind::Label(Label::new(NO_SPEED).align(Align::Right)),
        &[(StyleKey::Font, StyleValue::font(&PROFONT_24_POINT))],
    )?;
    let unit = app.add_styled(
        root,
        Rectangle::new(Point::new(196, 52), Size::new(80, 24)),
        WidgetKind::Label(Label::new("km/h")),
        &[(StyleKey::Font, StyleValue::font(&PROFONT_18_POINT))],
    )?;
    let graph = app.add(
        root,
        Rectangle::new(Point::new(10, 96), Size::new(300, 100)),
        WidgetKind::Graph(Graph::new().with_trend()),
    )?;

    let page = GpsPage { speed, graph };
    app.register_page(
        "GPS",
        vec![speed, unit, graph],
        keys::page_keys(&[keys::GPS_ALIVE, keys::GPS_SPEED_KMH]),
        move |app: &mut Application, snapshot: &Snapshot| report(page.update(app, snapshot), "update GPS page"),
    )
}

impl GpsPage {
    fn update(
        &self,
        app: &mut Application,
        snapshot: &Snapshot,
    ) -> Result<(), UiError> {
        let speed = snapshot
            .parse::<f32>(keys::GPS_SPEED_KMH)
            .filter(|speed| speed.is_finite() && *speed >= 0.0);
        match speed {
            Some(speed) => {
                app.set_text(self.speed, &speed_text(speed))?;
                app.push_sample(self.graph, speed)
            }
            None => app.set_text(self.speed, NO_SPEED),
        }
    }
}

fn speed_text(kmh: f32) -> String<8> {
    let mut out = String::new();
    write!(out, "{:.0}", kmh.min(999.0)).ok();
    out
}

#[cfg(test)]
mod tests {
    use dashboard_ui::AppConfig;

    use super::*;

    fn label_text(
        app: &Application,
        id: WidgetId,
    ) -> std::string::String {
        match app.widget(id).map(|n| n.kind()) {
            Some(WidgetKind::Label(label)) => label.text.clone(),
            _ => panic!("not a label"),
        }
    }

    #[test]
    fn test_speed_text() {
        assert_eq!(speed_text(88.4).as_str(), "88");
        assert_eq!(speed_text(5000.0).as_str(), "999", "clamped to three digits");
    }

    #[test]
    fn test_update_speed_and_graph() {
        let mut app = Application::new(AppConfig::default());
        let root = app.root();
        let speed = app.add(root, Rectangle::zero(), WidgetKind::Label(Label::new(NO_SPEED))).unwrap();
        let graph = app.add(root, Rectangle::zero(), WidgetKind::Graph(Graph::new())).unwrap();
        let page = GpsPage { speed, graph };

        let snapshot: Snapshot = [(keys::GPS_SPEED_KMH, Some("57.6".to_owned()))].into_iter().collect();
        page.update(&mut app, &snapshot).unwrap();
        assert_eq!(label_text(&app, speed), "58");

        let snapshot: Snapshot = [(keys::GPS_SPEED_KMH, None)].into_iter().collect();
        page.update(&mut app, &snapshot).unwrap();
        assert_eq!(label_text(&app, speed), NO_SPEED, "absent speed shows placeholder");

        let Some(WidgetKind::Graph(graph)) = app.widget(graph).map(|n| n.kind()) else {
            panic!("not a graph");
        };
        assert_eq!(graph.len(), 1, "absent samples are not plotted");
    }
}
