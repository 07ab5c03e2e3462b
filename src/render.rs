//! Painting the widget tree.
//!
//! # Paint Order
//!
//! | Layer | Contents |
//! |-------|----------|
//! | Root | the root widget and its packed descendants |
//! | Windows | the window stack, oldest first, each with its descendants |
//! | Popups | the popup chain, opened first to last |
//!
//! Every frame repaints everything. Each widget fills its background (unless the
//! background is the style's transparent color), draws the border for its current
//! look, then its kind-specific content inside the border. Children are clipped
//! to their container's view: a child scrolled half out of view is drawn half.
//! Chrome children (title bar buttons) are clipped to the window instead.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::app::Application;
use crate::config::{DECORATION_PITCH, TITLE_HEIGHT};
use crate::container::Orientation;
use crate::scrollbar::ScrollStep;
use crate::style::{BorderKind, StyleKey};
use crate::text::{Align, Wrap};
use crate::widget::{Node, WidgetId, WidgetKind};
use crate::widgets::primitives::{
    ArrowDirection, draw_arrow, draw_border, draw_outline, draw_text_block, fill_rect, inside_border,
};
use crate::widgets::Look;
use crate::window::WindowData;

/// Horizontal padding of title and popup item text.
const TEXT_PADDING: i32 = 4;

impl Application {
    /// Paint the root, then every stacked window, then every open popup.
    pub fn draw<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let screen = Rectangle::new(Point::zero(), self.config.screen);
        self.draw_widget(display, self.root(), screen);
        for &window in &self.wm.windows {
            self.draw_widget(display, window, screen);
        }
        for &popup in &self.wm.popups {
            self.draw_widget(display, popup, screen);
        }
    }

    fn draw_widget<D>(
        &self,
        display: &mut D,
        id: WidgetId,
        clip: Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let rect = self.tree.absolute_rect(id);
        let visible = clip.intersection(&rect);
        if visible.is_zero_sized() {
            return;
        }

        self.paint(&mut display.clipped(&visible), id, node, rect);

        if node.children.is_empty() {
            return;
        }
        let inner = Rectangle::new(self.tree.inner_origin(id), node.view_size());
        let content_clip = visible.intersection(&inner);
        for &child in &node.children {
            let chrome = self.tree.get(child).is_some_and(|c| c.chrome);
            self.draw_widget(display, child, if chrome { visible } else { content_clip });
        }
    }

    /// Interaction state `id` is drawn in.
    fn look(
        &self,
        id: WidgetId,
        node: &Node,
    ) -> Look {
        let hovered = self.is_hovered(id);
        let selected = matches!(node.kind, WidgetKind::PopupItem(_))
            && node.parent.is_some_and(|popup| self.popup_selection(popup) == Some(id));
        Look {
            disabled: !node.is_enabled(),
            hovered,
            pressed: hovered && self.wm.pressed == Some(id),
            selected,
        }
    }

    /// Whether `id` holds keyboard focus in the active window (or the root when
    /// no window is active).
    fn has_focus(
        &self,
        id: WidgetId,
    ) -> bool {
        let top = self.wm.active.unwrap_or_else(|| self.root());
        self.focused(top) == Some(id)
    }

    fn paint<D>(
        &self,
        display: &mut D,
        id: WidgetId,
        node: &Node,
        rect: Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = node.style();
        let look = self.look(id, node);

        let background = look.background(style);
        if background != style.color(StyleKey::Transparent) {
            fill_rect(display, rect, background);
        }
        let border = if matches!(node.kind, WidgetKind::Root) { BorderKind::None } else { look.border(style) };
        draw_border(display, rect, border, style);
        let area = inside_border(rect, border);

        match &node.kind {
            WidgetKind::Label(label) => label.draw(display, area, style, look),
            WidgetKind::Button(button) => button.draw(display, area, style, look),
            WidgetKind::Image(image) => image.draw(display, area, style, &self.assets),
            WidgetKind::ProgressBar(bar) => bar.draw(display, area, style),
            WidgetKind::Graph(graph) => graph.draw(display, area, style),
            WidgetKind::ScrollStep(step) => {
                draw_arrow(display, area.center(), arrow_for(*step), look.text_color(style));
            }
            WidgetKind::Window(window) => self.draw_title_bar(display, id, window, area),
            WidgetKind::PopupItem(item) => {
                let mut text_area = area;
                text_area.top_left.x += TEXT_PADDING;
                text_area.size.width = text_area.size.width.saturating_sub(3 * TEXT_PADDING as u32);
                let font = style.font(StyleKey::Font);
                draw_text_block(display, text_area, &item.text, Wrap::Ellipsis, Align::Left, font, look.text_color(style));
                if item.submenu.is_some() {
                    let tip = Point::new(area.top_left.x + area.size.width as i32 - 6, area.center().y);
                    draw_arrow(display, tip, ArrowDirection::Right, look.text_color(style));
                }
            }
            WidgetKind::PopupSeparator => {
                let line = Rectangle::new(
                    Point::new(area.top_left.x + 2, area.center().y),
                    Size::new(area.size.width.saturating_sub(4), 1),
                );
                fill_rect(display, line, style.color(StyleKey::BorderColor));
            }
            WidgetKind::Root
            | WidgetKind::Panel
            | WidgetKind::Scrollbar(_)
            | WidgetKind::ScrollThumb
            | WidgetKind::Popup(_) => {}
        }

        if self.has_focus(id)
            && let Some(color) = style.optional_color(StyleKey::BorderActive)
        {
            draw_outline(display, rect, color);
        }
    }

    /// Title strip of a titled window, in the active or inactive colors.
    fn draw_title_bar<D>(
        &self,
        display: &mut D,
        id: WidgetId,
        window: &WindowData,
        area: Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(title) = &window.title else {
            return;
        };
        let Some(style) = self.tree.get(id).map(Node::style) else {
            return;
        };
        let (background, text) = if self.wm.active == Some(id) {
            (StyleKey::BackgroundTitle, StyleKey::TextTitle)
        } else {
            (StyleKey::BackgroundTitleInactive, StyleKey::TextTitleInactive)
        };
        let inset = area.top_left.y - self.tree.absolute_origin(id).y;
        let height = (TITLE_HEIGHT as i32 - inset).max(0) as u32;
        let bar = Rectangle::new(area.top_left, Size::new(area.size.width, height));
        fill_rect(display, bar, style.color(background));

        let decorations = u32::from(window.close.is_some()) + u32::from(window.help.is_some());
        let reserved = decorations * DECORATION_PITCH as u32 + TEXT_PADDING as u32;
        let text_area = Rectangle::new(
            bar.top_left + Point::new(TEXT_PADDING, 0),
            Size::new(bar.size.width.saturating_sub(reserved), bar.size.height),
        );
        draw_text_block(
            display,
            text_area,
            title,
            Wrap::Ellipsis,
            Align::Left,
            style.font(StyleKey::TitleFont),
            style.color(text),
        );
    }
}

const fn arrow_for(step: ScrollStep) -> ArrowDirection {
    match (step.orientation, step.direction < 0) {
        (Orientation::Vertical, true) => ArrowDirection::Up,
        (Orientation::Vertical, false) => ArrowDirection::Down,
        (Orientation::Horizontal, true) => ArrowDirection::Left,
        (Orientation::Horizontal, false) => ArrowDirection::Right,
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mock_display::MockDisplay;

    use super::*;
    use crate::colors::{BLACK, DARK_GRAY, GREEN, LIGHT_GRAY, NAVY, RED, TRANSPARENT_KEY, WHITE};
    use crate::config::AppConfig;
    use crate::event::{Event, MouseButton};
    use crate::style::StyleValue;
    use crate::widgets::{Button, Label};
    use crate::window::{Decorations, WindowOptions};

    fn rect(
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    ) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    fn app() -> Application {
        Application::new(AppConfig { screen: Size::new(64, 64), ..AppConfig::default() })
    }

    fn render(app: &Application) -> MockDisplay<Rgb565> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        app.draw(&mut display);
        display
    }

    fn fill(color: Rgb565) -> [(StyleKey, StyleValue); 2] {
        [
            (StyleKey::Background, StyleValue::Color(color)),
            (StyleKey::Border, StyleValue::Border(BorderKind::None)),
        ]
    }

    // -------------------------------------------------------------------------
    // Layers and clipping
    // -------------------------------------------------------------------------

    #[test]
    fn test_root_fills_screen() {
        let display = render(&app());
        assert_eq!(display.affected_area(), rect(0, 0, 64, 64));
        assert_eq!(display.get_pixel(Point::new(0, 0)), Some(BLACK), "root draws no border");
    }

    #[test]
    fn test_child_clipped_to_scrolled_view() {
        let mut app = app();
        let root = app.root();
        let panel = app.add_styled(root, rect(10, 10, 20, 20), WidgetKind::Panel, &fill(BLACK)).unwrap();
        app.add_styled(panel, rect(0, 0, 20, 40), WidgetKind::Panel, &fill(RED)).unwrap();
        app.set_view_offset(panel, Point::new(0, 10));

        let display = render(&app);
        assert_eq!(display.get_pixel(Point::new(15, 15)), Some(RED));
        assert_eq!(display.get_pixel(Point::new(15, 35)), Some(BLACK), "red content clipped at the panel edge");
    }

    #[test]
    fn test_hidden_widget_not_drawn() {
        let mut app = app();
        let root = app.root();
        let panel = app.add_styled(root, rect(0, 0, 10, 10), WidgetKind::Panel, &fill(GREEN)).unwrap();
        app.set_visible(panel, false);
        assert_eq!(render(&app).get_pixel(Point::new(5, 5)), Some(BLACK));
    }

    #[test]
    fn test_transparent_background_skipped() {
        let mut app = app();
        let root = app.root();
        let red = app.add_styled(root, rect(0, 0, 20, 20), WidgetKind::Panel, &fill(RED)).unwrap();
        app.add_styled(red, rect(0, 0, 10, 10), WidgetKind::Panel, &fill(TRANSPARENT_KEY)).unwrap();
        assert_eq!(render(&app).get_pixel(Point::new(5, 5)), Some(RED));
    }

    #[test]
    fn test_windows_paint_in_stack_order() {
        let mut app = app();
        let root = app.root();
        let lower = app
            .window_styled(root, rect(0, 0, 40, 40), &WindowOptions::default(), &fill(RED))
            .unwrap();
        let upper = app
            .window_styled(root, rect(20, 20, 40, 40), &WindowOptions::default(), &fill(GREEN))
            .unwrap();
        app.show_window(lower, false).unwrap();
        app.show_window(upper, false).unwrap();
        assert_eq!(render(&app).get_pixel(Point::new(30, 30)), Some(GREEN));

        app.raise(lower);
        assert_eq!(render(&app).get_pixel(Point::new(30, 30)), Some(RED));
    }

    // -------------------------------------------------------------------------
    // Title bar and looks
    // -------------------------------------------------------------------------

    #[test]
    fn test_title_bar_follows_activation() {
        let mut app = app();
        let root = app.root();
        let window = app.window(root, rect(0, 0, 60, 50), &WindowOptions::titled("Trip", Decorations::CLOSE)).unwrap();
        app.show_window(window, false).unwrap();
        assert_eq!(render(&app).get_pixel(Point::new(30, 3)), Some(DARK_GRAY), "inactive title");

        app.set_active_window(Some(window));
        assert_eq!(render(&app).get_pixel(Point::new(30, 3)), Some(NAVY), "active title");
    }

    #[test]
    fn test_pressed_button_draws_sunken() {
        let mut app = app();
        let root = app.root();
        app.add(root, rect(10, 10, 30, 16), WidgetKind::Button(Button::new("Go"))).unwrap();
        let before = render(&app).get_pixel(Point::new(10, 10));
        assert_eq!(before, Some(DARK_GRAY), "flat border at rest");

        app.dispatch(Event::ButtonDown { pos: Point::new(20, 18), button: MouseButton::Left });
        let pressed = render(&app);
        assert_eq!(pressed.get_pixel(Point::new(10, 10)), Some(DARK_GRAY), "shadow top-left");
        assert_eq!(pressed.get_pixel(Point::new(39, 25)), Some(LIGHT_GRAY), "highlight bottom-right");
    }

    #[test]
    fn test_label_text_drawn_inside() {
        let mut app = app();
        let root = app.root();
        app.add(root, rect(0, 0, 60, 14), WidgetKind::Label(Label::new("88"))).unwrap();
        let display = render(&app);
        let white = Rectangle::new(Point::new(1, 1), Size::new(58, 12))
            .points()
            .filter(|&p| display.get_pixel(p) == Some(WHITE))
            .count();
        assert!(white > 0, "label text painted in the text color");
    }

    #[test]
    fn test_scroll_arrows_follow_direction() {
        let up = ScrollStep { direction: -1, orientation: Orientation::Vertical };
        let right = ScrollStep { direction: 1, orientation: Orientation::Horizontal };
        assert_eq!(arrow_for(up), ArrowDirection::Up);
        assert_eq!(arrow_for(right), ArrowDirection::Right);
    }
}
