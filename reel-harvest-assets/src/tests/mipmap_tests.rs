use image::{Rgba, RgbaImage};

use super::*;

/// A 100x50 black canvas with a white 40x20 block at (30, 10).
fn dark_logo() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(100, 50, Rgba([10, 10, 10, 255]));
    for y in 10..30 {
        for x in 30..70 {
            img.put_pixel(x, y, Rgba([250, 250, 250, 255]));
        }
    }
    img
}

#[test]
fn test_dark_pixels_become_transparent() {
    let mut img = dark_logo();
    remove_dark_background(&mut img, 120);
    assert_eq!(img.get_pixel(0, 0), &Rgba([10, 10, 10, 0]));
    assert_eq!(img.get_pixel(40, 15)[3], 255);
}

#[test]
fn test_threshold_is_strict() {
    // Mean of exactly 120 stays.
    let mut img = RgbaImage::from_pixel(1, 1, Rgba([120, 120, 120, 255]));
    remove_dark_background(&mut img, 120);
    assert_eq!(img.get_pixel(0, 0)[3], 255);

    let mut img = RgbaImage::from_pixel(1, 1, Rgba([119, 120, 120, 255]));
    remove_dark_background(&mut img, 120);
    assert_eq!(img.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_opaque_bounds() {
    let mut img = dark_logo();
    remove_dark_background(&mut img, 120);
    assert_eq!(opaque_bounds(&img), Some((30, 10, 40, 20)));

    let empty = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
    assert_eq!(opaque_bounds(&empty), None);
}

#[test]
fn test_logo_dimensions_truncate() {
    // 48 * 0.85 = 40.8
    assert_eq!(logo_dimensions(40, 20, 48, 0.85), (40, 20));
    assert_eq!(logo_dimensions(20, 40, 48, 0.85), (20, 40));
    assert_eq!(logo_dimensions(10, 10, 192, 0.85), (163, 163));
    assert_eq!(logo_dimensions(300, 1, 48, 0.85), (40, 1));
}

#[test]
fn test_icon_is_centred_on_background() {
    let logo = RgbaImage::from_pixel(10, 10, Rgba([200, 0, 0, 255]));
    let options = MipmapOptions::default();
    let icon = render_icon(&logo, 48, &options);
    assert_eq!(icon.dimensions(), (48, 48));
    assert_eq!(icon.get_pixel(0, 0), &Rgba([240, 240, 245, 255]));
    let centre = icon.get_pixel(24, 24);
    assert!(centre[0] > 190 && centre[1] < 10 && centre[2] < 10, "{centre:?}");
}

#[test]
fn test_generate_mipmaps_writes_every_density() {
    let dir = tempfile::tempdir().unwrap();
    let logo_path = dir.path().join("logo.png");
    dark_logo().save(&logo_path).unwrap();
    let out = dir.path().join("res");

    let written = generate_mipmaps(&logo_path, "pixel", &out, &MipmapOptions::default()).unwrap();
    assert_eq!(written.len(), DENSITIES.len());

    for (density, size) in DENSITIES {
        let path = out
            .join(format!("mipmap-{density}"))
            .join("ic_launcher_pixel.webp");
        assert!(written.contains(&path));
        let icon = image::open(&path).unwrap().into_rgba8();
        assert_eq!(icon.dimensions(), (size, size));
        // Corners show the light background, not the logo's black canvas.
        assert_eq!(icon.get_pixel(0, 0), &Rgba([240, 240, 245, 255]));
    }
}

#[test]
fn test_invalid_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = generate_mipmaps(
        &dir.path().join("missing.png"),
        "../escape",
        dir.path(),
        &MipmapOptions::default(),
    );
    assert!(matches!(result, Err(AssetError::InvalidName(_))));
}
