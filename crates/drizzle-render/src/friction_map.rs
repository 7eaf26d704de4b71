//! Grayscale friction texture sampled for lateral drag

use drizzle_core::{Color, DrizzleError, Result};
use image::{GrayImage, Luma, RgbaImage};
use std::path::Path;

/// Grayscale lookup texture. Darker pixels mean less friction.
///
/// Lookups use a bottom-left origin and wrap (repeat) on both axes, so
/// out-of-range and negative coordinates are valid.
#[derive(Debug, Clone)]
pub struct FrictionMap {
    image: GrayImage,
}

impl FrictionMap {
    /// Load from any format the `image` crate decodes
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .map_err(|e| DrizzleError::ImageError(format!("{}: {e}", path.display())))?;
        Self::from_rgba(&decoded.to_rgba8())
    }

    /// Convert a color image using perceptual luminance
    pub fn from_rgba(rgba: &RgbaImage) -> Result<Self> {
        let image = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let p = rgba.get_pixel(x, y).0;
            let c = Color::new(
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
                1.0,
            );
            Luma([(c.grayscale() * 255.0).round().clamp(0.0, 255.0) as u8])
        });
        Self::from_image(image)
    }

    pub fn from_image(image: GrayImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DrizzleError::ImageError("friction map has no pixels".into()));
        }
        Ok(Self { image })
    }

    /// Build from a function of bottom-left-origin coordinates returning 0..1
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Result<Self> {
        let image = GrayImage::from_fn(width, height, |x, y| {
            let v = f(x, height.saturating_sub(1) - y);
            Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8])
        });
        Self::from_image(image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Grayscale value in 0..1 at pixel (x, y)
    pub fn grayscale(&self, x: i32, y: i32) -> f32 {
        let w = self.image.width() as i32;
        let h = self.image.height() as i32;
        let px = x.rem_euclid(w) as u32;
        let py = y.rem_euclid(h);
        let row = (h - 1 - py) as u32;
        self.image.get_pixel(px, row).0[0] as f32 / 255.0
    }
}
