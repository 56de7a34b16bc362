//! Re-decoding a finished animation for display surfaces

use crate::error::GifResult;
use imgref::ImgVec;
use rgb::RGBA8;
use std::io::Read;

/// One decoded animation frame plus how long to show it.
pub struct PreviewFrame {
    pub pixels: ImgVec<RGBA8>,
    pub delay_ms: u32,
}

/// Decode a whole animation into displayable frames.
///
/// Disposal is applied while reading, so each returned frame is the full
/// composited screen, ready to blit as-is.
pub fn decode_frames<R: Read>(reader: R) -> GifResult<Vec<PreviewFrame>> {
    let mut gif_opts = gif::DecodeOptions::new();
    // Important:
    gif_opts.set_color_output(gif::ColorOutput::Indexed);

    let mut decoder = gif_opts.read_info(reader)?;
    let mut screen = gif_dispose::Screen::new_decoder(&decoder);

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        screen.blit_frame(frame)?;
        frames.push(PreviewFrame {
            pixels: screen.pixels_rgba().map_buf(|buf| buf.to_owned()),
            delay_ms: u32::from(frame.delay) * 10,
        });
    }
    Ok(frames)
}

/// Playback position for a surface that flips frames on a timer.
///
/// The presenting surface calls [`advance`](Self::advance) once per frame
/// delay; the index wraps around so playback loops until the surface closes.
pub struct FrameCycler {
    frame_count: usize,
    index: usize,
}

impl FrameCycler {
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self { frame_count, index: 0 }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.index
    }

    /// Step to the next frame, wrapping modulo the frame count.
    pub fn advance(&mut self) -> usize {
        if self.frame_count > 0 {
            self.index = (self.index + 1) % self.frame_count;
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycler_wraps_modulo_frame_count() {
        let mut cycler = FrameCycler::new(3);
        assert_eq!(cycler.current(), 0);
        assert_eq!(cycler.advance(), 1);
        assert_eq!(cycler.advance(), 2);
        assert_eq!(cycler.advance(), 0);
    }

    #[test]
    fn empty_cycler_stays_put() {
        let mut cycler = FrameCycler::new(0);
        assert_eq!(cycler.advance(), 0);
    }
}
