#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

use digit_mlp::{Matrix, Network, Topology};

/// White canvas with one black filled square, like a stroke drawn on the web canvas.
pub fn square_on_canvas(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
        Luma([if inside { 0 } else { 255 }])
    })
}

pub fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png).unwrap();
    buf
}

// ---------------------------------------------------------------------------
// Seven-segment digits on the 28×28 grid (20×20 content, 4 px margin)
// ---------------------------------------------------------------------------

/// (row start, row end, col start, col end), half-open.
const SEGMENTS: [(usize, usize, usize, usize); 7] = [
    (4, 7, 6, 22),    // a: top
    (4, 14, 19, 22),  // b: top right
    (14, 24, 19, 22), // c: bottom right
    (21, 24, 6, 22),  // d: bottom
    (14, 24, 6, 9),   // e: bottom left
    (4, 14, 6, 9),    // f: top left
    (12, 16, 6, 22),  // g: middle
];

const DIGIT_SEGMENTS: [&str; 10] = [
    "abcdef", "bc", "abdeg", "abcdg", "bcfg", "acdfg", "acdefg", "abc", "abcdefg", "abcdfg",
];

/// 784 pixels, 1.0 where the digit's segments are lit.
pub fn segment_bitmap(digit: usize) -> Vec<f64> {
    let mut px = vec![0.0; 784];
    for seg in DIGIT_SEGMENTS[digit].bytes() {
        let (r0, r1, c0, c1) = SEGMENTS[(seg - b'a') as usize];
        for r in r0..r1 {
            for c in c0..c1 {
                px[r * 28 + c] = 1.0;
            }
        }
    }
    px
}

/// Fixed, hand-built digit-topology weights: hidden unit `d` of the first
/// layer scores how well the input matches digit `d`'s segments (+1 on lit
/// pixels, -1 elsewhere, minus half the template size), the other two layers
/// route that score straight to output `d`.
pub fn template_network() -> Network {
    let t = Topology::DIGITS;
    let mut w1 = Matrix::zeros(t.input, t.hidden1);
    let mut b1 = Matrix::zeros(1, t.hidden1);
    for d in 0..10 {
        let bitmap = segment_bitmap(d);
        let lit = bitmap.iter().filter(|&&v| v > 0.0).count();
        for (i, &v) in bitmap.iter().enumerate() {
            w1.set(i, d, if v > 0.0 { 1.0 } else { -1.0 });
        }
        b1.set(0, d, -(lit as f64) / 2.0);
    }

    let mut w2 = Matrix::zeros(t.hidden1, t.hidden2);
    let mut w3 = Matrix::zeros(t.hidden2, t.output);
    for d in 0..10 {
        w2.set(d, d, 1.0);
        w3.set(d, d, 0.1);
    }

    Network::from_parameters(
        t,
        [
            (w1, b1),
            (w2, Matrix::zeros(1, t.hidden2)),
            (w3, Matrix::zeros(1, t.output)),
        ],
    )
    .unwrap()
}
