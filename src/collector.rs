//! For adding frames to the assembler
//!
//! [`gifstitch::new()`][crate::new] returns the [`Collector`] that gathers the
//! still images, and a [`Writer`][crate::Writer] that performs normalization,
//! compression and I/O.

pub use imgref::ImgVec;
pub use rgb::{RGB8, RGBA8};

use crate::error::GifResult;
use crossbeam_channel::Sender;
use std::path::PathBuf;

pub(crate) enum FrameSource {
    Pixels(ImgVec<RGBA8>),
    PngData(Vec<u8>),
    Path(PathBuf),
}

pub(crate) struct InputFrame {
    /// The still image to normalize and encode
    pub frame: FrameSource,
    pub frame_index: usize,
}

/// Collect stills that will become the animation frames
///
/// Note that writing will start only when the collector is dropped.
/// Drop the collector (or collect on another thread) before calling
/// [`Writer::write()`][crate::Writer::write].
pub struct Collector {
    pub(crate) queue: Sender<InputFrame>,
}

impl Collector {
    /// Use an already-decoded image as one frame.
    ///
    /// Frame index starts at 0 and determines the frame's position in the
    /// output animation. Set each index only once, but you can set them in any
    /// order. Alpha, if present, is flattened over the configured background.
    pub fn add_frame_rgba(&self, frame_index: usize, frame: ImgVec<RGBA8>) -> GifResult<()> {
        self.queue.send(InputFrame {
            frame_index,
            frame: FrameSource::Pixels(frame),
        })?;
        Ok(())
    }

    /// Use in-memory PNG-compressed data as one frame.
    ///
    /// Frame index starts at 0 and determines the frame's position in the
    /// output animation. Set each index only once, but you can set them in any
    /// order.
    #[inline]
    pub fn add_frame_png_data(&self, frame_index: usize, png_data: Vec<u8>) -> GifResult<()> {
        self.queue.send(InputFrame {
            frame: FrameSource::PngData(png_data),
            frame_index,
        })?;
        Ok(())
    }

    /// Read and decode a PNG file from disk as one frame.
    ///
    /// Frame index starts at 0 and determines the frame's position in the
    /// output animation. Set each index only once, but you can set them in any
    /// order.
    pub fn add_frame_png_file(&self, frame_index: usize, path: PathBuf) -> GifResult<()> {
        self.queue.send(InputFrame {
            frame: FrameSource::Path(path),
            frame_index,
        })?;
        Ok(())
    }
}
