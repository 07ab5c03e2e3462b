//! Image assets as raw little-endian RGB565 pixel data.
//!
//! Images are decoded once when loaded and drawn straight from memory. A widget
//! that names a key the store does not hold draws a placeholder instead; the
//! first miss per key is logged, later misses are silent so the frame loop does
//! not flood the log.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;

use crate::error::AssetError;

/// Decoded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    pixels: Vec<Rgb565>,
}

impl RawImage {
    /// Decode `bytes` (two bytes per pixel, little endian) into rows of `width`.
    pub fn from_bytes(
        bytes: &[u8],
        width: u32,
    ) -> Result<Self, AssetError> {
        let row_bytes = width as usize * 2;
        if row_bytes == 0 || bytes.is_empty() || bytes.len() % row_bytes != 0 {
            return Err(AssetError::InvalidSize { len: bytes.len(), width });
        }
        let pixels = bytes
            .chunks_exact(2)
            .map(|pair| Rgb565::from(RawU16::new(u16::from_le_bytes([pair[0], pair[1]]))))
            .collect();
        Ok(Self { width, pixels })
    }

    pub fn size(&self) -> Size { Size::new(self.width, (self.pixels.len() / self.width as usize) as u32) }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(
        &self,
        x: u32,
        y: u32,
    ) -> Option<Rgb565> {
        if x >= self.width {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<String, RawImage>,
    reported_missing: RefCell<HashSet<String>>,
}

impl ImageStore {
    /// Read a raw RGB565 file from disk and store it under `key`.
    pub fn load(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        width: u32,
    ) -> Result<(), AssetError> {
        let path = path.as_ref();
        let bytes = fs::read(path).inspect_err(|err| {
            tracing::warn!(key, path = %path.display(), error = %err, "failed to read image");
        })?;
        self.insert_raw(key, &bytes, width)
    }

    pub fn insert_raw(
        &mut self,
        key: &str,
        bytes: &[u8],
        width: u32,
    ) -> Result<(), AssetError> {
        let image = RawImage::from_bytes(bytes, width)?;
        tracing::debug!(key, width, height = image.size().height, "image loaded");
        self.reported_missing.borrow_mut().remove(key);
        self.images.insert(key.to_owned(), image);
        Ok(())
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&RawImage> {
        let image = self.images.get(key);
        if image.is_none() && self.reported_missing.borrow_mut().insert(key.to_owned()) {
            tracing::warn!(key, "image asset missing, drawing placeholder");
        }
        image
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<RawImage> {
        self.images.remove(key)
    }

    pub fn len(&self) -> usize { self.images.len() }

    pub fn is_empty(&self) -> bool { self.images.is_empty() }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::IntoStorage;

    use super::*;
    use crate::colors::{RED, WHITE};

    fn bytes(pixels: &[Rgb565]) -> Vec<u8> {
        pixels.iter().flat_map(|p| p.into_storage().to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_rows() {
        let image = RawImage::from_bytes(&bytes(&[RED, WHITE, WHITE, RED]), 2).unwrap();
        assert_eq!(image.size(), Size::new(2, 2));
        assert_eq!(image.pixel(1, 0), Some(WHITE));
        assert_eq!(image.pixel(1, 1), Some(RED));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.pixel(0, 2), None);
    }

    #[test]
    fn test_reject_partial_rows() {
        let result = RawImage::from_bytes(&bytes(&[RED, WHITE, RED]), 2);
        assert!(matches!(result, Err(AssetError::InvalidSize { len: 6, width: 2 })));
        assert!(RawImage::from_bytes(&[], 4).is_err());
        assert!(RawImage::from_bytes(&[0, 0], 0).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error_not_a_panic() {
        let mut store = ImageStore::default();
        let result = store.load("logo", "/nonexistent/logo.raw", 16);
        assert!(matches!(result, Err(AssetError::Io(_))));
        assert!(store.is_empty());
        assert!(store.get("logo").is_none());
    }

    #[test]
    fn test_insert_and_replace() {
        let mut store = ImageStore::default();
        store.insert_raw("icon", &bytes(&[RED]), 1).unwrap();
        store.insert_raw("icon", &bytes(&[WHITE, WHITE]), 2).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("icon").map(RawImage::size), Some(Size::new(2, 1)));
    }
}
