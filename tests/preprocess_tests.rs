mod common;

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use digit_mlp::preprocess::{
    binarize_inverted, foreground_bounds, gaussian_blur_5x5, otsu_threshold, preprocess,
    preprocess_gray, BoundingBox, Preprocessed,
};
use digit_mlp::Error;

fn expect_digit(p: Preprocessed) -> digit_mlp::Matrix {
    match p {
        Preprocessed::Digit(m) => m,
        Preprocessed::Empty => panic!("expected a digit, got Empty"),
    }
}

#[test]
fn test_all_zero_image_is_no_digit() {
    assert_eq!(preprocess_gray(&GrayImage::new(64, 64)), Preprocessed::Empty);
}

#[test]
fn test_blank_white_canvas_is_no_digit() {
    let white = GrayImage::from_pixel(280, 280, Luma([255]));
    assert_eq!(preprocess_gray(&white), Preprocessed::Empty);

    let png = common::encode_png(DynamicImage::ImageLuma8(white));
    assert_eq!(preprocess(&png).unwrap(), Preprocessed::Empty);
}

#[test]
fn test_square_bounding_box_is_exact() {
    for &(w, h, x, y, side) in &[(64, 64, 22, 22, 20), (100, 80, 10, 30, 35), (40, 40, 5, 5, 8)] {
        let img = common::square_on_canvas(w, h, x, y, side);
        let blurred = gaussian_blur_5x5(&img);
        let t = otsu_threshold(&blurred).unwrap();
        let bounds = foreground_bounds(&binarize_inverted(&blurred, t));
        assert_eq!(bounds, Some(BoundingBox { x, y, width: side, height: side }));
    }
}

#[test]
fn test_bright_square_on_black_selects_the_background() {
    let img = GrayImage::from_fn(40, 40, |x, y| {
        let inside = (15..25).contains(&x) && (15..25).contains(&y);
        Luma([if inside { 255 } else { 0 }])
    });
    let blurred = gaussian_blur_5x5(&img);
    let t = otsu_threshold(&blurred).unwrap();
    let binary = binarize_inverted(&blurred, t);

    assert_eq!(binary.get_pixel(0, 0).0[0], 255);
    assert_eq!(binary.get_pixel(20, 20).0[0], 0);
    assert_eq!(
        foreground_bounds(&binary),
        Some(BoundingBox { x: 0, y: 0, width: 40, height: 40 })
    );
}

#[test]
fn test_square_fills_the_inner_frame() {
    let img = common::square_on_canvas(64, 64, 22, 22, 20);
    let input = expect_digit(preprocess_gray(&img));

    assert_eq!(input.shape(), (1, 784));
    assert!(input.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    for r in 0..28 {
        for c in 0..28 {
            let v = input.get(0, r * 28 + c);
            let margin = r < 4 || r >= 24 || c < 4 || c >= 24;
            if margin {
                assert_eq!(v, 0.0, "margin pixel ({}, {})", r, c);
            }
        }
    }
    assert!(input.get(0, 14 * 28 + 14) > 0.9);
}

#[test]
fn test_output_is_always_bounded() {
    // diagonal stroke on a noisy grey background
    let img = GrayImage::from_fn(90, 70, |x, y| {
        let on_stroke = (x as i32 - y as i32 - 10).abs() < 4;
        let noise = ((x * 31 + y * 17) % 23) as u8;
        Luma([if on_stroke { 20 + noise } else { 180 + noise }])
    });
    let input = expect_digit(preprocess_gray(&img));
    assert_eq!(input.shape(), (1, 784));
    assert!(input.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert!(input.data.iter().any(|&v| v > 0.5));
}

#[test]
fn test_disconnected_strokes_share_one_box() {
    let mut img = common::square_on_canvas(100, 100, 10, 10, 12);
    for x in 70..85 {
        for y in 60..90 {
            img.put_pixel(x, y, Luma([0]));
        }
    }
    let blurred = gaussian_blur_5x5(&img);
    let t = otsu_threshold(&blurred).unwrap();
    let bounds = foreground_bounds(&binarize_inverted(&blurred, t)).unwrap();
    assert_eq!((bounds.x, bounds.y), (10, 10));
    assert_eq!((bounds.x + bounds.width, bounds.y + bounds.height), (85, 90));
}

#[test]
fn test_rgba_canvas_is_accepted() {
    let img = RgbaImage::from_fn(50, 50, |x, y| {
        if (15..35).contains(&x) && (10..40).contains(&y) {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let png = common::encode_png(DynamicImage::ImageRgba8(img));
    let input = expect_digit(preprocess(&png).unwrap());
    assert_eq!(input.shape(), (1, 784));
}

#[test]
fn test_preprocessing_is_reproducible() {
    let png = common::encode_png(DynamicImage::ImageLuma8(common::square_on_canvas(120, 90, 30, 20, 40)));
    assert_eq!(preprocess(&png).unwrap(), preprocess(&png).unwrap());
}

#[test]
fn test_undecodable_bytes_are_a_decode_error() {
    assert!(matches!(preprocess(&[0x89, b'P', b'N', b'G', 0, 1, 2]), Err(Error::Decode(_))));
    assert!(matches!(preprocess(b""), Err(Error::Decode(_))));
}
