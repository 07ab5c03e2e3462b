use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::primitives::{draw_cross, draw_outline};
use crate::assets::{ImageStore, RawImage};
use crate::style::{Style, StyleKey};

/// Picture drawn from the application's image store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageView {
    /// Asset key in the [`ImageStore`].
    pub key: String,
}

impl ImageView {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_owned() }
    }

    /// Draw the image at the top-left of `area`. Pixels in the style's
    /// transparent color are skipped. A missing asset draws a crossed-out box.
    pub fn draw<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        style: &Style,
        store: &ImageStore,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        match store.get(&self.key) {
            Some(image) => draw_image(display, area, image, style.color(StyleKey::Transparent)),
            None => {
                let color = style.color(StyleKey::TextDisabled);
                draw_outline(display, area, color);
                draw_cross(display, area, color);
            }
        }
    }
}

fn draw_image<D>(
    display: &mut D,
    area: Rectangle,
    image: &RawImage,
    transparent: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let size = image.size();
    let visible = Size::new(size.width.min(area.size.width), size.height.min(area.size.height));
    let origin = area.top_left;
    let pixels = Rectangle::new(Point::zero(), visible).points().filter_map(|p| {
        image
            .pixel(p.x as u32, p.y as u32)
            .filter(|&color| color != transparent)
            .map(|color| Pixel(origin + p, color))
    });
    display.draw_iter(pixels).ok();
}
