use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::{AssetError, check_name};

/// Android launcher densities and their icon edge in pixels.
pub const DENSITIES: [(&str, u32); 5] = [
    ("mdpi", 48),
    ("hdpi", 72),
    ("xhdpi", 96),
    ("xxhdpi", 144),
    ("xxxhdpi", 192),
];

#[derive(Debug, Clone)]
pub struct MipmapOptions {
    /// Pixels whose mean RGB is below this become transparent.
    pub threshold: u8,
    /// Share of the icon edge the logo's longer side occupies.
    pub fill: f64,
    pub background: Rgba<u8>,
}

impl Default for MipmapOptions {
    fn default() -> Self {
        Self {
            threshold: 120,
            fill: 0.85,
            background: Rgba([240, 240, 245, 255]),
        }
    }
}

/// Write `mipmap-<density>/ic_launcher_<name>.webp` under `out_dir` for
/// every density, returning the written paths.
///
/// The logo's dark backdrop is cut away and the remainder cropped before
/// it is centred on a light square, so dark logos stay legible on launcher
/// rows.
pub fn generate_mipmaps(
    logo: &Path,
    name: &str,
    out_dir: &Path,
    options: &MipmapOptions,
) -> Result<Vec<PathBuf>, AssetError> {
    check_name(name)?;
    let mut img = image::open(logo)?.into_rgba8();
    remove_dark_background(&mut img, options.threshold);
    let cropped = match opaque_bounds(&img) {
        Some((x, y, w, h)) => imageops::crop_imm(&img, x, y, w, h).to_image(),
        None => {
            log::warn!("{}: nothing left after background removal", logo.display());
            img
        }
    };

    let mut written = Vec::with_capacity(DENSITIES.len());
    for (density, size) in DENSITIES {
        let icon = render_icon(&cropped, size, options);
        let dir = out_dir.join(format!("mipmap-{density}"));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("ic_launcher_{name}.webp"));
        write_webp(&icon, &path)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Make every pixel darker than `threshold` (mean of R, G, B) fully
/// transparent. Colour channels are left as they are.
pub fn remove_dark_background(img: &mut RgbaImage, threshold: u8) {
    for pixel in img.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let mean = (r as u32 + g as u32 + b as u32) as f64 / 3.0;
        if mean < threshold as f64 {
            pixel.0[3] = 0;
        }
    }
}

/// Bounding box `(x, y, width, height)` of the pixels with non-zero alpha.
pub(crate) fn opaque_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut any = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel.0[3] != 0 {
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    any.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Logo dimensions inside a `size` square: the longer side takes
/// `fill * size`, the shorter keeps the aspect ratio. Truncates like the
/// icons already shipped.
pub(crate) fn logo_dimensions(src_w: u32, src_h: u32, size: u32, fill: f64) -> (u32, u32) {
    let edge = (size as f64 * fill) as u32;
    if src_w == 0 || src_h == 0 {
        return (edge.max(1), edge.max(1));
    }
    let aspect = src_w as f64 / src_h as f64;
    let (w, h) = if aspect > 1.0 {
        (edge, (edge as f64 / aspect) as u32)
    } else {
        ((edge as f64 * aspect) as u32, edge)
    };
    (w.max(1), h.max(1))
}

pub(crate) fn render_icon(logo: &RgbaImage, size: u32, options: &MipmapOptions) -> RgbaImage {
    let (w, h) = logo_dimensions(logo.width(), logo.height(), size, options.fill);
    let resized = imageops::resize(logo, w, h, FilterType::Lanczos3);
    let mut icon = RgbaImage::from_pixel(size, size, options.background);
    let x = (size - w) / 2;
    let y = (size - h) / 2;
    imageops::overlay(&mut icon, &resized, x as i64, y as i64);
    icon
}

fn write_webp(img: &RgbaImage, path: &Path) -> Result<(), AssetError> {
    let writer = BufWriter::new(File::create(path)?);
    img.write_with_encoder(WebPEncoder::new_lossless(writer))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/mipmap_tests.rs"]
mod tests;
