//! Frame geometry: common canvas sizing, shrink-to-fit scaling, centered composite

use crate::error::GifResult;
use imgref::{ImgRef, ImgVec};
use rgb::{RGB8, RGBA8};

/// Common canvas: the per-axis maximum over all inputs, computed once per batch.
pub(crate) fn canvas_size(frames: &[ImgVec<RGB8>]) -> (usize, usize) {
    let width = frames.iter().map(|f| f.width()).max().unwrap_or(0);
    let height = frames.iter().map(|f| f.height()).max().unwrap_or(0);
    (width, height)
}

/// Largest size that fits the canvas while keeping the frame's aspect ratio.
/// Scale is `min(canvas_w/w, canvas_h/h)` capped at 1: frames only ever
/// shrink, so a frame smaller than the canvas on both axes keeps its size and
/// is merely centered.
pub(crate) fn fitted_size(width: usize, height: usize, canvas_width: usize, canvas_height: usize) -> (usize, usize) {
    let scale = (canvas_width as f64 / width as f64)
        .min(canvas_height as f64 / height as f64)
        .min(1.0);
    let new_width = (width as f64 * scale).round() as usize;
    let new_height = (height as f64 * scale).round() as usize;
    (new_width.clamp(1, canvas_width), new_height.clamp(1, canvas_height))
}

/// Offsets for centering; integer division biases an odd leftover to the top/left edge.
pub(crate) fn centered_offsets(canvas_width: usize, canvas_height: usize, width: usize, height: usize) -> (usize, usize) {
    ((canvas_width - width) / 2, (canvas_height - height) / 2)
}

/// Drop the alpha channel by compositing over `background`.
pub(crate) fn flatten(image: ImgVec<RGBA8>, background: RGB8) -> ImgVec<RGB8> {
    let (buf, width, height) = image.into_contiguous_buf();
    let over = |c: u8, b: u8, a: u8| -> u8 {
        ((u16::from(c) * u16::from(a) + u16::from(b) * u16::from(255 - a) + 127) / 255) as u8
    };
    let pixels = buf.iter().map(|px| {
        if px.a == 255 {
            RGB8::new(px.r, px.g, px.b)
        } else {
            RGB8::new(over(px.r, background.r, px.a), over(px.g, background.g, px.a), over(px.b, background.b, px.a))
        }
    }).collect();
    ImgVec::new(pixels, width, height)
}

/// Scale a frame down to fit the canvas and paint it centered over `background`.
///
/// Frames already at the fitted size skip resampling entirely, so a frame that
/// exactly fills the canvas passes through untouched.
pub(crate) fn normalize_frame(frame: ImgRef<'_, RGB8>, canvas_width: usize, canvas_height: usize, background: RGB8) -> GifResult<ImgVec<RGB8>> {
    let (new_width, new_height) = fitted_size(frame.width(), frame.height(), canvas_width, canvas_height);

    let scaled = if new_width == frame.width() && new_height == frame.height() {
        frame.pixels().collect::<Vec<_>>()
    } else {
        let src: Vec<RGB8> = frame.pixels().collect();
        let mut dst = vec![RGB8::new(0, 0, 0); new_width * new_height];
        let mut resizer = resize::new(frame.width(), frame.height(), new_width, new_height, resize::Pixel::RGB8, resize::Type::Lanczos3)?;
        resizer.resize(&src, &mut dst)?;
        dst
    };

    let (left, top) = centered_offsets(canvas_width, canvas_height, new_width, new_height);
    let mut canvas = vec![background; canvas_width * canvas_height];
    for (row_index, row) in scaled.chunks_exact(new_width).enumerate() {
        let start = (top + row_index) * canvas_width + left;
        canvas[start..start + new_width].copy_from_slice(row);
    }
    Ok(ImgVec::new(canvas, canvas_width, canvas_height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, px: RGB8) -> ImgVec<RGB8> {
        ImgVec::new(vec![px; width * height], width, height)
    }

    fn px_at(image: &ImgVec<RGB8>, x: usize, y: usize) -> RGB8 {
        image.buf()[y * image.stride() + x]
    }

    #[test]
    fn canvas_is_per_axis_maximum() {
        let frames = [solid(100, 50, RGB8::new(1, 2, 3)), solid(60, 120, RGB8::new(4, 5, 6))];
        assert_eq!(canvas_size(&frames), (100, 120));
    }

    #[test]
    fn never_upscales() {
        for &(w, h) in &[(100usize, 50usize), (60, 120), (1, 1), (99, 33)] {
            let (nw, nh) = fitted_size(w, h, 100, 120);
            assert!(nw <= w && nh <= h, "{}x{} grew to {}x{}", w, h, nw, nh);
        }
    }

    #[test]
    fn keeps_aspect_ratio_within_a_pixel() {
        let (nw, nh) = fitted_size(300, 200, 150, 400);
        assert_eq!((nw, nh), (150, 100));

        // non-integer scale rounds, so allow one pixel of drift
        let (nw, nh) = fitted_size(99, 33, 50, 50);
        let ideal_h = 33.0 * (nw as f64 / 99.0);
        assert!((nh as f64 - ideal_h).abs() <= 1.0);
    }

    #[test]
    fn small_frame_keeps_its_size() {
        assert_eq!(fitted_size(10, 10, 100, 120), (10, 10));
        assert_eq!(centered_offsets(100, 120, 10, 10), (45, 55));
    }

    #[test]
    fn centering_floors_odd_leftovers_to_top_left() {
        assert_eq!(centered_offsets(100, 120, 100, 60), (0, 30));
        assert_eq!(centered_offsets(5, 5, 2, 2), (1, 1));
    }

    #[test]
    fn exact_fit_frame_passes_through() {
        let red = RGB8::new(200, 10, 10);
        let frame = solid(50, 50, red);
        let out = normalize_frame(frame.as_ref(), 50, 50, RGB8::new(255, 255, 255)).unwrap();
        assert_eq!((out.width(), out.height()), (50, 50));
        assert!(out.pixels().all(|px| px == red));
    }

    #[test]
    fn narrow_frame_is_centered_over_background() {
        let red = RGB8::new(200, 0, 0);
        let white = RGB8::new(255, 255, 255);
        let frame = solid(100, 60, red);
        let out = normalize_frame(frame.as_ref(), 100, 120, white).unwrap();
        assert_eq!(px_at(&out, 50, 0), white);
        assert_eq!(px_at(&out, 50, 29), white);
        assert_eq!(px_at(&out, 50, 30), red);
        assert_eq!(px_at(&out, 50, 89), red);
        assert_eq!(px_at(&out, 50, 90), white);
    }

    #[test]
    fn flatten_blends_over_background() {
        let image = ImgVec::new(vec![RGBA8::new(255, 0, 0, 255), RGBA8::new(255, 0, 0, 0)], 2, 1);
        let out = flatten(image, RGB8::new(0, 0, 255));
        assert_eq!(px_at(&out, 0, 0), RGB8::new(255, 0, 0));
        assert_eq!(px_at(&out, 1, 0), RGB8::new(0, 0, 255));
    }
}
