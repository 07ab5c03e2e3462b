//! Scrolling line graph of recent samples.
//!
//! Samples live in a fixed-capacity ring ([`heapless::Deque`]); pushing into a
//! full history drops the oldest sample. The y range follows the local min/max of
//! whatever is in the history, recomputed on every push.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Deque;

use super::primitives::{ArrowDirection, draw_arrow, draw_sparkline};
use crate::style::{Style, StyleKey};

/// Samples kept per graph.
pub const GRAPH_HISTORY_SIZE: usize = 60;

/// Samples averaged at each end of the history to detect a trend.
const TREND_WINDOW: usize = 10;

/// Minimum difference between the two trend windows to count as a trend.
const TREND_THRESHOLD: f32 = 0.5;

/// Width reserved on the right for the trend arrow.
const TREND_GUTTER: u32 = 10;

#[derive(Clone, Debug, Default)]
pub struct Graph {
    samples: Deque<f32, GRAPH_HISTORY_SIZE>,
    min: f32,
    max: f32,
    /// Draw a rising/falling arrow next to the line.
    pub show_trend: bool,
}

impl Graph {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub const fn with_trend(mut self) -> Self {
        self.show_trend = true;
        self
    }

    pub fn push(
        &mut self,
        value: f32,
    ) {
        if !value.is_finite() {
            return;
        }
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Capacity was just ensured
        self.samples.push_back(value).ok();
        self.recalculate_range();
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.recalculate_range();
    }

    pub fn len(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    /// Samples oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ { self.samples.iter().copied() }

    /// Samples oldest first, as one contiguous slice.
    fn ordered(&self) -> heapless::Vec<f32, GRAPH_HISTORY_SIZE> { self.samples.iter().copied().collect() }

    /// Local `(min, max)` of the history, `None` while empty.
    pub fn range(&self) -> Option<(f32, f32)> { (!self.samples.is_empty()).then_some((self.min, self.max)) }

    /// `Some(true)` when the newest samples average clearly above the oldest,
    /// `Some(false)` when clearly below, `None` when stable or too short.
    pub fn trend(&self) -> Option<bool> {
        let samples = self.ordered();
        if samples.len() < TREND_WINDOW * 2 {
            return None;
        }
        let recent = samples[samples.len() - TREND_WINDOW..].iter().sum::<f32>() / TREND_WINDOW as f32;
        let older = samples[..TREND_WINDOW].iter().sum::<f32>() / TREND_WINDOW as f32;
        let diff = recent - older;
        if diff.abs() < TREND_THRESHOLD { None } else { Some(diff > 0.0) }
    }

    fn recalculate_range(&mut self) {
        let (min, max) = self
            .samples
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), &value| (min.min(value), max.max(value)));
        self.min = min;
        self.max = max;
    }

    pub fn draw<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        style: &Style,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let color = style.color(StyleKey::TextColor);
        let Some((min, max)) = self.range() else {
            return;
        };

        let mut line_area = area;
        if self.show_trend && area.size.width > TREND_GUTTER {
            line_area.size.width -= TREND_GUTTER;
            if let Some(rising) = self.trend() {
                let center = Point::new(
                    area.top_left.x + (area.size.width - TREND_GUTTER / 2) as i32,
                    area.center().y,
                );
                let direction = if rising { ArrowDirection::Up } else { ArrowDirection::Down };
                draw_arrow(display, center, direction, color);
            }
        }
        draw_sparkline(display, line_area, &self.ordered(), min, max, color);
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mock_display::MockDisplay;

    use super::*;
    use crate::style::DEFAULT_STYLE;

    #[test]
    fn test_history_drops_oldest() {
        let mut graph = Graph::new();
        for i in 0..(GRAPH_HISTORY_SIZE + 5) {
            graph.push(i as f32);
        }
        assert_eq!(graph.len(), GRAPH_HISTORY_SIZE);
        assert_eq!(graph.samples().next(), Some(5.0), "oldest five were dropped");
        assert_eq!(graph.range(), Some((5.0, (GRAPH_HISTORY_SIZE + 4) as f32)));
    }

    #[test]
    fn test_range_follows_history() {
        let mut graph = Graph::new();
        assert_eq!(graph.range(), None);
        graph.push(3.0);
        graph.push(-1.0);
        graph.push(f32::NAN);
        assert_eq!(graph.range(), Some((-1.0, 3.0)));
        assert_eq!(graph.len(), 2, "non-finite samples are ignored");
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.range(), None);
    }

    #[test]
    fn test_trend() {
        let mut graph = Graph::new();
        for _ in 0..10 {
            graph.push(10.0);
        }
        assert_eq!(graph.trend(), None, "needs twenty samples");
        for _ in 0..10 {
            graph.push(20.0);
        }
        assert_eq!(graph.trend(), Some(true));

        let mut falling = Graph::new();
        for i in 0..20 {
            falling.push(100.0 - i as f32);
        }
        assert_eq!(falling.trend(), Some(false));

        let mut stable = Graph::new();
        for i in 0..20 {
            stable.push(if i % 2 == 0 { 5.0 } else { 5.2 });
        }
        assert_eq!(stable.trend(), None);
    }

    #[test]
    fn test_draw_stays_inside_area() {
        let mut graph = Graph::new().with_trend();
        for i in 0..30 {
            graph.push(i as f32);
        }
        let mut display = MockDisplay::<Rgb565>::new();
        display.set_allow_overdraw(true);
        let area = Rectangle::new(Point::new(2, 2), Size::new(50, 20));
        graph.draw(&mut display, area, &DEFAULT_STYLE);
        let drawn = display.affected_area();
        assert!(!drawn.is_zero_sized());
        assert_eq!(drawn.intersection(&area), drawn, "nothing drawn outside the graph");
    }
}
