use image::{GrayImage, Luma};

/// Binomial taps of the 5×5 Gaussian whose sigma is derived from the kernel
/// size (sigma = 0.3·((5-1)·0.5 - 1) + 0.8 rounds to exactly these weights).
const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
const KERNEL_RADIUS: isize = 2;

/// Reflect-101 border: `dcb|abcd|cba` with the edge pixel not repeated.
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Separable 5×5 Gaussian blur in integer arithmetic (weights sum to 256,
/// results rounded half-up), so identical input always gives identical output.
pub fn gaussian_blur_5x5(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    if wu == 0 || hu == 0 {
        return img.clone();
    }

    let mut horizontal = vec![0u32; wu * hu];
    for y in 0..hu {
        for x in 0..wu {
            let mut acc = 0;
            for (k, &weight) in KERNEL.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - KERNEL_RADIUS, wu);
                acc += weight * img.get_pixel(sx as u32, y as u32).0[0] as u32;
            }
            horizontal[y * wu + x] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..hu {
        for x in 0..wu {
            let mut acc = 0;
            for (k, &weight) in KERNEL.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - KERNEL_RADIUS, hu);
                acc += weight * horizontal[sy * wu + x];
            }
            out.put_pixel(x as u32, y as u32, Luma([((acc + 128) >> 8) as u8]));
        }
    }
    out
}

/// Otsu's global threshold: the intensity that maximises the between-class
/// variance of the histogram. Returns `None` when no split separates two
/// non-empty classes (a uniform image).
pub fn otsu_threshold(img: &GrayImage) -> Option<u8> {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let total = img.width() as f64 * img.height() as f64;
    if total == 0.0 {
        return None;
    }

    let mu: f64 = hist.iter().enumerate().map(|(i, &c)| i as f64 * c as f64).sum::<f64>() / total;
    let eps = f32::EPSILON as f64;

    let (mut q1, mut mu1) = (0.0f64, 0.0f64);
    let mut best: Option<(f64, u8)> = None;
    for (i, &count) in hist.iter().enumerate() {
        let p_i = count as f64 / total;
        mu1 *= q1;
        q1 += p_i;
        let q2 = 1.0 - q1;
        if q1.min(q2) < eps || q1.max(q2) > 1.0 - eps {
            continue;
        }
        mu1 = (mu1 + i as f64 * p_i) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        // strict > keeps the lowest threshold on ties
        if best.map_or(sigma > 0.0, |(s, _)| sigma > s) {
            best = Some((sigma, i as u8));
        }
    }
    best.map(|(_, t)| t)
}

/// Inverted binary threshold: `p > t → 0`, otherwise `255`.
/// Dark strokes on a light background become the foreground.
pub fn binarize_inverted(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0[0] = if p.0[0] > threshold { 0 } else { 255 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_mirrors_without_repeating_the_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-2, 2), 0);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn blur_keeps_flat_regions_flat() {
        let img = GrayImage::from_pixel(9, 7, Luma([200]));
        assert_eq!(gaussian_blur_5x5(&img), img);
    }

    #[test]
    fn blur_spreads_a_step_edge() {
        let img = GrayImage::from_fn(10, 1, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let b = gaussian_blur_5x5(&img);
        // 5/16 of the taps at x = 5 see the dark side, 11/16 at x = 4.
        assert_eq!(b.get_pixel(5, 0).0[0], 175);
        assert_eq!(b.get_pixel(4, 0).0[0], 80);
        assert_eq!(b.get_pixel(0, 0).0[0], 0);
        assert_eq!(b.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn otsu_splits_two_levels() {
        let img = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 3 { 30 } else { 220 }]));
        let t = otsu_threshold(&img).unwrap();
        assert!((30..220).contains(&t));
        let bin = binarize_inverted(&img, t);
        assert_eq!(bin.get_pixel(0, 0).0[0], 255);
        assert_eq!(bin.get_pixel(7, 7).0[0], 0);
    }

    #[test]
    fn otsu_on_uniform_image_is_none() {
        assert_eq!(otsu_threshold(&GrayImage::new(5, 5)), None);
        assert_eq!(otsu_threshold(&GrayImage::from_pixel(5, 5, Luma([255]))), None);
    }
}
