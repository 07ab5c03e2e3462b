//! Low-level drawing primitives shared across widgets.
//!
//! Everything here is generic over `D: DrawTarget<Color = Rgb565>` so the same
//! code paints the simulator window and the test `MockDisplay`. Draw errors are
//! ignored with `.ok()`: a failed primitive leaves its pixels untouched and the
//! frame continues.
//!
//! # Bevels
//!
//! Bevelled borders draw the top/left edges first and the bottom/right edges
//! second, so the corner pixels shared by both belong to the bottom/right color.
//!
//! # Sparkline
//!
//! [`draw_sparkline`] auto-scales to the min/max of its samples with 2px padding.
//! The x step uses the actual sample count, not the history capacity, so a short
//! history still spans the full width.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::style::{BorderKind, Style, StyleKey};
use crate::text::{Align, Wrap, chars_that_fit, layout_lines};

/// Direction an arrow icon points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

pub fn fill_rect<D>(
    display: &mut D,
    rect: Rectangle,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    rect.into_styled(PrimitiveStyle::with_fill(color)).draw(display).ok();
}

/// One-pixel outline on the inside edge of `rect`.
pub fn draw_outline<D>(
    display: &mut D,
    rect: Rectangle,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    rect.into_styled(PrimitiveStyle::with_stroke(color, 1)).draw(display).ok();
}

fn draw_line<D>(
    display: &mut D,
    from: Point,
    to: Point,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    Line::new(from, to).into_styled(PrimitiveStyle::with_stroke(color, 1)).draw(display).ok();
}

/// Two-tone one-pixel frame: `top_left` on the top and left edges, `bottom_right`
/// on the bottom and right edges.
fn draw_bevel<D>(
    display: &mut D,
    rect: Rectangle,
    top_left: Rgb565,
    bottom_right: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let Some(br) = rect.bottom_right() else {
        return;
    };
    let tl = rect.top_left;
    draw_line(display, tl, Point::new(br.x, tl.y), top_left);
    draw_line(display, tl, Point::new(tl.x, br.y), top_left);
    draw_line(display, Point::new(tl.x, br.y), br, bottom_right);
    draw_line(display, Point::new(br.x, tl.y), br, bottom_right);
}

/// Paint `kind` along the inside edge of `rect` using the border colors of `style`.
pub fn draw_border<D>(
    display: &mut D,
    rect: Rectangle,
    kind: BorderKind,
    style: &Style,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let color = style.color(StyleKey::BorderColor);
    let shadow = style.color(StyleKey::BorderShadow);
    let highlight = style.color(StyleKey::BorderHighlight);
    let highlight_shadow = style.color(StyleKey::BorderHighlightShadow);

    match kind {
        BorderKind::None => {}
        BorderKind::Flat => draw_outline(display, rect, color),
        BorderKind::RaisedFlat => draw_outline(display, rect, highlight),
        BorderKind::SunkenFlat => draw_outline(display, rect, shadow),
        BorderKind::SimpleRaised => draw_bevel(display, rect, highlight, shadow),
        BorderKind::SimpleSunken => draw_bevel(display, rect, shadow, highlight),
        BorderKind::Raised => {
            draw_bevel(display, rect, highlight, color);
            draw_bevel(display, rect.offset(-1), highlight_shadow, shadow);
        }
        BorderKind::Sunken => {
            draw_bevel(display, rect, shadow, highlight);
            draw_bevel(display, rect.offset(-1), color, highlight_shadow);
        }
    }
}

/// `rect` shrunk by the width of `kind` on every side.
pub fn inside_border(
    rect: Rectangle,
    kind: BorderKind,
) -> Rectangle {
    rect.offset(-(kind.width() as i32))
}

/// Small arrow icon centered on `center`, as used on scrollbar step buttons.
///
/// The shaft is 8px long and the head 6px wide.
pub fn draw_arrow<D>(
    display: &mut D,
    center: Point,
    direction: ArrowDirection,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let Point { x, y } = center;
    let (tail, tip, wing_a, wing_b) = match direction {
        ArrowDirection::Up => ((x, y + 4), (x, y - 4), (x - 3, y - 1), (x + 3, y - 1)),
        ArrowDirection::Down => ((x, y - 4), (x, y + 4), (x - 3, y + 1), (x + 3, y + 1)),
        ArrowDirection::Left => ((x + 4, y), (x - 4, y), (x - 1, y - 3), (x - 1, y + 3)),
        ArrowDirection::Right => ((x - 4, y), (x + 4, y), (x + 1, y - 3), (x + 1, y + 3)),
    };
    let tip = Point::from(tip);
    draw_line(display, Point::from(tail), tip, color);
    draw_line(display, Point::from(wing_a), tip, color);
    draw_line(display, Point::from(wing_b), tip, color);
}

/// Diagonal cross filling `rect` minus a 2px margin.
pub fn draw_cross<D>(
    display: &mut D,
    rect: Rectangle,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let inner = rect.offset(-2);
    let Some(br) = inner.bottom_right() else {
        return;
    };
    let tl = inner.top_left;
    draw_line(display, tl, br, color);
    draw_line(display, Point::new(br.x, tl.y), Point::new(tl.x, br.y), color);
}

/// Lay out `text` inside `area` and draw it, vertically centered.
pub fn draw_text_block<D>(
    display: &mut D,
    area: Rectangle,
    text: &str,
    wrap: Wrap,
    align: Align,
    font: &MonoFont<'_>,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if text.is_empty() || area.is_zero_sized() {
        return;
    }
    let lines = layout_lines(text, chars_that_fit(font, area.size.width), wrap);
    let line_height = font.character_size.height as i32;
    let block_height = line_height * lines.len() as i32;
    let top = area.top_left.y + ((area.size.height as i32 - block_height) / 2).max(0);

    let (alignment, x) = match align {
        Align::Left => (Alignment::Left, area.top_left.x),
        Align::Center => (Alignment::Center, area.center().x),
        Align::Right => (Alignment::Right, area.top_left.x + area.size.width as i32 - 1),
    };
    let character_style = MonoTextStyle::new(font, color);
    let text_style = TextStyleBuilder::new().alignment(alignment).baseline(Baseline::Top).build();

    for (index, line) in lines.iter().enumerate() {
        let position = Point::new(x, top + index as i32 * line_height);
        Text::with_text_style(line, position, character_style, text_style).draw(display).ok();
    }
}

/// Line graph of `samples` (oldest first) inside `rect`.
///
/// `min`/`max` set the y range; when they are closer than 0.1 the graph is drawn as
/// a flat line through the middle.
pub fn draw_sparkline<D>(
    display: &mut D,
    rect: Rectangle,
    samples: &[f32],
    min: f32,
    max: f32,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let count = samples.len();
    if count < 2 || rect.size.width < 5 || rect.size.height < 5 {
        return;
    }

    let graph_width = rect.size.width as i32 - 4;
    let graph_height = rect.size.height as i32 - 4;
    let graph_x = rect.top_left.x + 2;
    let graph_y = rect.top_left.y + 2;
    let max_x = graph_x + graph_width - 1;
    let max_y = graph_y + graph_height - 1;

    let range = max - min;
    let y_scale = if range > 0.1 { (graph_height - 1) as f32 / range } else { 0.0 };
    let x_step = (graph_width - 1) as f32 / (count - 1) as f32;

    let mut previous: Option<Point> = None;
    for (index, &value) in samples.iter().enumerate() {
        let screen_x = (graph_x + (index as f32 * x_step) as i32).min(max_x);
        let screen_y = if y_scale > 0.0 {
            (graph_y + graph_height - 1 - ((value - min) * y_scale) as i32).clamp(graph_y, max_y)
        } else {
            graph_y + (graph_height - 1) / 2
        };
        let point = Point::new(screen_x, screen_y);
        if let Some(previous) = previous {
            draw_line(display, previous, point, color);
        }
        previous = Some(point);
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    use super::*;
    use crate::colors::{BLACK, RED, WHITE, YELLOW};
    use crate::style::{DEFAULT_STYLE, StyleValue};

    fn display() -> MockDisplay<Rgb565> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display
    }

    fn bevel_style() -> Style {
        DEFAULT_STYLE
            .derive(&[
                (StyleKey::BorderColor, StyleValue::Color(BLACK)),
                (StyleKey::BorderShadow, StyleValue::Color(RED)),
                (StyleKey::BorderHighlight, StyleValue::Color(WHITE)),
                (StyleKey::BorderHighlightShadow, StyleValue::Color(YELLOW)),
            ])
            .unwrap()
    }

    #[test]
    fn test_simple_bevels() {
        let style = bevel_style();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(10, 10));

        let mut raised = display();
        draw_border(&mut raised, rect, BorderKind::SimpleRaised, &style);
        assert_eq!(raised.get_pixel(Point::new(4, 0)), Some(WHITE));
        assert_eq!(raised.get_pixel(Point::new(0, 4)), Some(WHITE));
        assert_eq!(raised.get_pixel(Point::new(4, 9)), Some(RED));
        assert_eq!(raised.get_pixel(Point::new(9, 9)), Some(RED), "corner belongs to the bottom/right edge");
        assert_eq!(raised.get_pixel(Point::new(4, 4)), None, "interior untouched");

        let mut sunken = display();
        draw_border(&mut sunken, rect, BorderKind::SimpleSunken, &style);
        assert_eq!(sunken.get_pixel(Point::new(4, 0)), Some(RED));
        assert_eq!(sunken.get_pixel(Point::new(9, 4)), Some(WHITE));
    }

    #[test]
    fn test_double_bevel_uses_four_colors() {
        let style = bevel_style();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(10, 10));
        let mut display = display();
        draw_border(&mut display, rect, BorderKind::Raised, &style);

        assert_eq!(display.get_pixel(Point::new(4, 0)), Some(WHITE));
        assert_eq!(display.get_pixel(Point::new(4, 1)), Some(YELLOW));
        assert_eq!(display.get_pixel(Point::new(4, 9)), Some(BLACK));
        assert_eq!(display.get_pixel(Point::new(4, 8)), Some(RED));
        assert_eq!(display.get_pixel(Point::new(4, 4)), None);
    }

    #[test]
    fn test_flat_variants() {
        let style = bevel_style();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(6, 6));
        for (kind, expected) in [
            (BorderKind::Flat, BLACK),
            (BorderKind::RaisedFlat, WHITE),
            (BorderKind::SunkenFlat, RED),
        ] {
            let mut display = display();
            draw_border(&mut display, rect, kind, &style);
            assert_eq!(display.get_pixel(Point::new(0, 0)), Some(expected), "{kind:?}");
            assert_eq!(display.get_pixel(Point::new(5, 5)), Some(expected), "{kind:?}");
        }

        let mut none = display();
        draw_border(&mut none, rect, BorderKind::None, &style);
        assert!(none.affected_area().is_zero_sized());
    }

    #[test]
    fn test_inside_border() {
        let rect = Rectangle::new(Point::new(10, 10), Size::new(20, 20));
        assert_eq!(inside_border(rect, BorderKind::Sunken), Rectangle::new(Point::new(12, 12), Size::new(16, 16)));
        assert_eq!(inside_border(rect, BorderKind::None), rect);
    }

    #[test]
    fn test_arrow_stays_near_center() {
        let mut display = display();
        draw_arrow(&mut display, Point::new(8, 8), ArrowDirection::Right, WHITE);
        assert_eq!(display.get_pixel(Point::new(12, 8)), Some(WHITE), "tip");
        assert_eq!(display.get_pixel(Point::new(4, 8)), Some(WHITE), "tail");
        let area = display.affected_area();
        assert_eq!(area, Rectangle::new(Point::new(4, 5), Size::new(9, 7)));
    }

    #[test]
    fn test_text_block_is_centered_vertically() {
        let mut display = display();
        let area = Rectangle::new(Point::new(0, 0), Size::new(60, 30));
        draw_text_block(&mut display, area, "Hi", Wrap::Ellipsis, Align::Left, &FONT_6X10, WHITE);
        let drawn = display.affected_area();
        assert!(!drawn.is_zero_sized(), "text was drawn");
        assert!(drawn.top_left.y >= 10, "one 10px line in a 30px area starts at y=10");
        assert!(drawn.top_left.y + drawn.size.height as i32 <= 20);
    }

    #[test]
    fn test_sparkline_flat_for_constant_samples() {
        let mut display = display();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(20, 11));
        draw_sparkline(&mut display, rect, &[5.0, 5.0, 5.0], 5.0, 5.0, WHITE);
        let area = display.affected_area();
        assert_eq!(area.size.height, 1, "flat line");
        assert_eq!(area.top_left, Point::new(2, 5));
        assert_eq!(area.size.width, 16);
    }

    #[test]
    fn test_sparkline_needs_two_samples() {
        let mut display = display();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(20, 20));
        draw_sparkline(&mut display, rect, &[1.0], 0.0, 2.0, WHITE);
        assert!(display.affected_area().is_zero_sized());
    }
}
