/*
 gifstitch PNG-sequence animated GIF maker
 © 2025 Scott Peterman

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use imgref::*;
use rgb::*;

mod error;
pub use crate::error::*;
pub mod collector;
pub use crate::collector::Collector;
use crate::collector::{FrameSource, InputFrame};
mod encoder;
mod normalize;
pub mod preview;
pub mod progress;
use crate::progress::*;

use crossbeam_channel::{Receiver, Sender};
use std::fs;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;

/// Fill colors the calling surface offers by name. Any other `RGB8` works too.
pub const NAMED_BACKGROUNDS: [(&str, RGB8); 6] = [
    ("white", RGB8 { r: 255, g: 255, b: 255 }),
    ("black", RGB8 { r: 0, g: 0, b: 0 }),
    ("blue", RGB8 { r: 0, g: 0, b: 255 }),
    ("red", RGB8 { r: 255, g: 0, b: 0 }),
    ("green", RGB8 { r: 0, g: 255, b: 0 }),
    ("gray", RGB8 { r: 128, g: 128, b: 128 }),
];

#[derive(Copy, Clone, Debug)]
pub struct Settings {
    /// How long every frame stays on screen, in milliseconds.
    /// Stored at the GIF's centisecond resolution, rounded to the nearest 10ms.
    pub delay_ms: u32,
    /// Canvas fill behind frames that don't cover the whole canvas,
    /// and the backing that translucent input pixels are flattened onto.
    pub background: RGB8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            background: RGB8 { r: 255, g: 255, b: 255 },
        }
    }
}

impl Settings {
    pub(crate) fn delay_units(&self) -> u16 {
        (self.delay_ms.saturating_add(5) / 10).clamp(1, u16::MAX.into()) as u16
    }
}

/// Normalize collected frames and perform GIF writing
pub struct Writer {
    queue: Receiver<InputFrame>,
    settings: Settings,
}

pub(crate) struct GIFFrame {
    image: ImgVec<u8>,
    pal: Vec<RGB8>,
    delay: u16,
}

pub(crate) trait Encoder {
    fn write_frame(&mut self, frame: GIFFrame) -> GifResult<()>;
    fn finish(&mut self) -> GifResult<()> {
        Ok(())
    }
    fn written_bytes(&self) -> u64 {
        0
    }
}

/// Start a new animation
///
/// The [`Collector`] gathers the stills and the [`Writer`] turns them into the
/// animation; they can be used on separate threads. The queue between them is
/// unbounded because every frame must be decoded before the common canvas size
/// is known, so nothing is written until the collector is dropped.
pub fn new(settings: Settings) -> GifResult<(Collector, Writer)> {
    let (queue, queue_iter) = crossbeam_channel::unbounded();

    Ok((
        Collector { queue },
        Writer {
            queue: queue_iter,
            settings,
        },
    ))
}

/// One-shot batch conversion: ordered PNG files in, one looping GIF out.
///
/// The whole invocation aborts on the first source that fails to decode, and
/// on any failure the destination file is removed, so a partial artifact never
/// survives. An empty `paths` list is rejected before the destination is even
/// created.
pub fn assemble(paths: &[PathBuf], settings: Settings, destination: &Path) -> GifResult<()> {
    if paths.is_empty() {
        return Err(Error::EmptyInput);
    }

    let (collector, writer) = new(settings)?;
    for (frame_index, path) in paths.iter().enumerate() {
        collector.add_frame_png_file(frame_index, path.clone())?;
    }
    drop(collector);

    let file = fs::File::create(destination)?;
    let result = writer.write(BufWriter::new(file), &mut NoProgress {});
    if result.is_err() {
        let _ = fs::remove_file(destination);
    }
    result
}

/// Normalize and encode collected frames
impl Writer {
    /// Start writing frames. Will not return until the `Collector` is dropped.
    ///
    /// `writer` can be any writer, such as `File` or `&mut Vec`.
    ///
    /// `ProgressReporter.increase()` is called each time a new frame is written.
    pub fn write<W: Write>(self, writer: W, reporter: &mut dyn ProgressReporter) -> GifResult<()> {
        self.write_with_encoder(&mut encoder::RustEncoder::new(writer), reporter)
    }

    fn write_with_encoder(self, enc: &mut dyn Encoder, reporter: &mut dyn ProgressReporter) -> GifResult<()> {
        let (frame_queue, frame_queue_iter) = crossbeam_channel::bounded(4);
        let input_queue = self.queue;
        let settings = self.settings;
        let make_thread = thread::Builder::new().name("normalize".into()).spawn(move || {
            Self::make_frames(input_queue, frame_queue, &settings)
        })?;
        Self::write_frames(frame_queue_iter, enc, reporter)?;
        make_thread.join().map_err(|_| Error::ThreadSend)??;
        Ok(())
    }

    /// Decode every source, size the common canvas, then normalize frames in
    /// input order into the write queue. Canvas sizing needs all decoded
    /// dimensions, which is why decoding completes before any resampling.
    fn make_frames(input_queue: Receiver<InputFrame>, frame_queue: Sender<GIFFrame>, settings: &Settings) -> GifResult<()> {
        let mut inputs: Vec<InputFrame> = input_queue.into_iter().collect();
        if inputs.is_empty() {
            return Err(Error::EmptyInput);
        }
        inputs.sort_by_key(|input| input.frame_index);

        let mut rasters = Vec::with_capacity(inputs.len());
        for InputFrame { frame, frame_index } in inputs {
            rasters.push(Self::decode(frame, frame_index, settings.background)?);
        }

        let (canvas_width, canvas_height) = normalize::canvas_size(&rasters);
        if canvas_width > u16::MAX.into() || canvas_height > u16::MAX.into() {
            return Err(Error::WrongSize(format!("Canvas {canvas_width}×{canvas_height} exceeds the GIF limit of 65535×65535")));
        }

        let delay = settings.delay_units();
        for raster in &rasters {
            let image = normalize::normalize_frame(raster.as_ref(), canvas_width, canvas_height, settings.background)?;
            let (image8, pal) = Self::quantize(image.as_ref())?;
            frame_queue.send(GIFFrame { image: image8, pal, delay })?;
        }
        Ok(())
    }

    fn decode(frame: FrameSource, frame_index: usize, background: RGB8) -> GifResult<ImgVec<RGB8>> {
        let image = match frame {
            FrameSource::Pixels(image) => image,
            FrameSource::PngData(data) => {
                let image = lodepng::decode32(&data)
                    .map_err(|err| Error::Decode(format!("Can't decode PNG data for frame #{frame_index}: {err}")))?;
                ImgVec::new(image.buffer, image.width, image.height)
            },
            FrameSource::Path(path) => {
                let image = lodepng::decode32_file(&path)
                    .map_err(|err| Error::Decode(format!("Can't load {}: {}", path.display(), err)))?;
                ImgVec::new(image.buffer, image.width, image.height)
            },
        };
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Decode(format!("Frame #{frame_index} is zero-sized")));
        }
        Ok(normalize::flatten(image, background))
    }

    fn quantize(image: ImgRef<'_, RGB8>) -> GifResult<(ImgVec<u8>, Vec<RGB8>)> {
        let mut liq = imagequant::Attributes::new();
        liq.set_quality(0, 100)?;
        let bitmap: Vec<RGBA8> = image.pixels().map(|px| RGBA8 { r: px.r, g: px.g, b: px.b, a: 255 }).collect();
        let mut img = liq.new_image(bitmap, image.width(), image.height(), 0.)?;
        let mut res = liq.quantize(&mut img)?;
        res.set_dithering_level(0.5)?;

        let (pal, pal_img) = res.remapped(&mut img)?;
        debug_assert_eq!(image.width() * image.height(), pal_img.len());

        let pal = pal.iter().map(|px| RGB8 { r: px.r, g: px.g, b: px.b }).collect();
        Ok((Img::new(pal_img, image.width(), image.height()), pal))
    }

    fn write_frames(frame_queue_iter: Receiver<GIFFrame>, enc: &mut dyn Encoder, reporter: &mut dyn ProgressReporter) -> GifResult<()> {
        for frame in frame_queue_iter {
            enc.write_frame(frame)?;
            reporter.written_bytes(enc.written_bytes());
            if !reporter.increase() {
                return Err(Error::Aborted);
            }
        }
        enc.finish()?;
        Ok(())
    }
}
