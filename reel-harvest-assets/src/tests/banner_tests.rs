use image::{Rgba, RgbaImage};

use super::*;

#[test]
fn test_banner_is_written_twice_at_tv_size() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("banner.png");
    RgbaImage::from_pixel(320, 180, Rgba([30, 60, 90, 255]))
        .save(&src)
        .unwrap();

    let written = resize_banner(&src, "watercolor", dir.path()).unwrap();
    assert_eq!(
        written,
        vec![
            dir.path().join("tv_banner_watercolor.png"),
            dir.path().join("app_icon_watercolor.png"),
        ]
    );
    for path in &written {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (BANNER_WIDTH, BANNER_HEIGHT));
    }
}

#[test]
fn test_missing_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(resize_banner(&dir.path().join("nope.png"), "pixel", dir.path()).is_err());
}
