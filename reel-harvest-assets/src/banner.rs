use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};

use crate::error::{AssetError, check_name};

/// Android TV banner at xxxhdpi: 320x180 dp times four.
pub const BANNER_WIDTH: u32 = 1280;
pub const BANNER_HEIGHT: u32 = 720;

/// Stretch `src` to the TV banner size and write it twice, as
/// `tv_banner_<name>.png` and `app_icon_<name>.png`.
pub fn resize_banner(
    src: &Path,
    name: &str,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, AssetError> {
    check_name(name)?;
    let img = image::open(src)?.into_rgba8();
    if img.width() * 9 != img.height() * 16 {
        log::warn!(
            "{} is {}x{}, not 16:9; it will be stretched",
            src.display(),
            img.width(),
            img.height()
        );
    }
    let resized = imageops::resize(&img, BANNER_WIDTH, BANNER_HEIGHT, FilterType::Lanczos3);

    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(2);
    for prefix in ["tv_banner", "app_icon"] {
        let path = out_dir.join(format!("{prefix}_{name}.png"));
        resized.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[path = "tests/banner_tests.rs"]
mod tests;
