//! Status bar icons, generated at startup so the dashboard runs without asset files.
//!
//! Icons are 16x16 RGB565 images keyed in the application's image store. Files
//! loaded from an assets directory under the same keys replace them.

use dashboard_ui::assets::ImageStore;
use dashboard_ui::colors::{DARK_GRAY, GREEN, RED, TRANSPARENT_KEY, WHITE};
use dashboard_ui::error::AssetError;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};

pub const ICON_SIZE: u32 = 16;

pub const ETH_UP: &str = "net.eth.up";
pub const ETH_DOWN: &str = "net.eth.down";
pub const WIFI_OFF: &str = "net.wifi.off";
pub const WIFI_LEVELS: [&str; 4] = ["net.wifi.0", "net.wifi.1", "net.wifi.2", "net.wifi.3"];

/// Strength reported for an adapter that is present but not associated.
const WIFI_DISCONNECTED: i32 = -2;

/// Icon key for a wireless adapter with signal `strength` (percent).
pub fn wifi_icon(strength: Option<i32>) -> &'static str {
    match strength {
        None => WIFI_OFF,
        Some(s) if s <= WIFI_DISCONNECTED => WIFI_OFF,
        Some(s) if s < 25 => WIFI_LEVELS[0],
        Some(s) if s < 50 => WIFI_LEVELS[1],
        Some(s) if s < 75 => WIFI_LEVELS[2],
        Some(_) => WIFI_LEVELS[3],
    }
}

/// Put every generated icon into `store`.
pub fn install(store: &mut ImageStore) -> Result<(), AssetError> {
    store.insert_raw(ETH_UP, &encode(&ethernet(GREEN)), ICON_SIZE)?;
    store.insert_raw(ETH_DOWN, &encode(&ethernet(DARK_GRAY)), ICON_SIZE)?;
    store.insert_raw(WIFI_OFF, &encode(&wifi(None)), ICON_SIZE)?;
    for (level, key) in WIFI_LEVELS.iter().enumerate() {
        store.insert_raw(key, &encode(&wifi(Some(level))), ICON_SIZE)?;
    }
    Ok(())
}

type Pixels = [Rgb565; (ICON_SIZE * ICON_SIZE) as usize];

fn encode(pixels: &Pixels) -> Vec<u8> {
    pixels.iter().flat_map(|p| p.into_storage().to_le_bytes()).collect()
}

/// Network jack: outline with contact pins.
fn ethernet(color: Rgb565) -> Pixels {
    let mut pixels = [TRANSPARENT_KEY; (ICON_SIZE * ICON_SIZE) as usize];
    for y in 3..14 {
        for x in 2..14 {
            let edge = y == 3 || y == 13 || x == 2 || x == 13;
            let pin = y == 5 && (4..12).contains(&x) && x % 2 == 0;
            let latch = y >= 11 && (6..10).contains(&x);
            if edge || pin || latch {
                pixels[(y * ICON_SIZE + x) as usize] = color;
            }
        }
    }
    pixels
}

/// Four rising bars, `level + 1` of them lit. `None` draws all bars dark and
/// crossed out.
fn wifi(level: Option<usize>) -> Pixels {
    let mut pixels = [TRANSPARENT_KEY; (ICON_SIZE * ICON_SIZE) as usize];
    for bar in 0..4u32 {
        let lit = level.is_some_and(|level| bar as usize <= level);
        let color = if lit { WHITE } else { DARK_GRAY };
        let height = 4 + bar * 3;
        for y in (ICON_SIZE - 1 - height)..ICON_SIZE - 1 {
            for x in (1 + bar * 4)..(4 + bar * 4) {
                pixels[(y * ICON_SIZE + x) as usize] = color;
            }
        }
    }
    if level.is_none() {
        for i in 1..8u32 {
            pixels[(i * ICON_SIZE + i) as usize] = RED;
            pixels[(i * ICON_SIZE + 8 - i) as usize] = RED;
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_icon_thresholds() {
        assert_eq!(wifi_icon(None), WIFI_OFF, "absent adapter");
        assert_eq!(wifi_icon(Some(-2)), WIFI_OFF, "not associated");
        assert_eq!(wifi_icon(Some(0)), WIFI_LEVELS[0]);
        assert_eq!(wifi_icon(Some(24)), WIFI_LEVELS[0]);
        assert_eq!(wifi_icon(Some(25)), WIFI_LEVELS[1]);
        assert_eq!(wifi_icon(Some(74)), WIFI_LEVELS[2]);
        assert_eq!(wifi_icon(Some(100)), WIFI_LEVELS[3]);
    }

    #[test]
    fn test_install_all_icons() {
        let mut store = ImageStore::default();
        install(&mut store).unwrap();
        assert_eq!(store.len(), 7);
        let icon = store.get(WIFI_LEVELS[3]).expect("generated");
        assert_eq!(icon.pixel(13, 14), Some(WHITE), "top bar lit at full strength");
        let off = store.get(WIFI_LEVELS[0]).expect("generated");
        assert_eq!(off.pixel(13, 14), Some(DARK_GRAY));
    }
}
