use crate::error::GifResult;
use crate::{Encoder, GIFFrame};
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

struct CountingWriter<W> {
    writer: W,
    written: Rc<Cell<u64>>,
}

impl<W: Write> Write for CountingWriter<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize, std::io::Error> {
        let len = self.writer.write(buf)?;
        self.written.set(self.written.get() + len as u64);
        Ok(len)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), std::io::Error> {
        self.writer.flush()
    }
}

pub(crate) struct RustEncoder<W: Write> {
    writer: Option<W>,
    written: Rc<Cell<u64>>,
    gif_enc: Option<gif::Encoder<CountingWriter<W>>>,
}

impl<W: Write> RustEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            written: Rc::default(),
            gif_enc: None,
        }
    }

    #[inline(never)]
    fn compress_frame(frame: GIFFrame) -> GifResult<gif::Frame<'static>> {
        let GIFFrame { image, pal, delay } = frame;

        let (buffer, width, height) = image.into_contiguous_buf();

        let mut pal_rgb: Vec<u8> = rgb::bytemuck::cast_slice(&pal).to_vec();
        // Palette should be power-of-two sized
        if pal.len() != 256 {
            let needed_size = 3 * pal.len().max(2).next_power_of_two();
            pal_rgb.resize(needed_size, 0);
        }
        let mut frame = gif::Frame {
            delay,
            dispose: gif::DisposalMethod::Keep,
            transparent: None,
            needs_user_input: false,
            top: 0,
            left: 0,
            width: u16::try_from(width)?,
            height: u16::try_from(height)?,
            interlaced: false,
            palette: Some(pal_rgb),
            buffer: buffer.into(),
        };

        frame.make_lzw_pre_encoded();
        Ok(frame)
    }
}

impl<W: Write> Encoder for RustEncoder<W> {
    fn write_frame(&mut self, frame: GIFFrame) -> GifResult<()> {
        let screen_width = u16::try_from(frame.image.width())?;
        let screen_height = u16::try_from(frame.image.height())?;
        let frame = Self::compress_frame(frame)?;

        let writer = &mut self.writer;
        let enc = match self.gif_enc {
            None => {
                let w = CountingWriter {
                    writer: writer.take().ok_or(crate::Error::ThreadSend)?,
                    written: self.written.clone(),
                };
                let mut enc = gif::Encoder::new(w, screen_width, screen_height, &[])?;
                enc.write_extension(gif::ExtensionData::Repetitions(gif::Repeat::Infinite))?;
                enc.write_raw_extension(gif::Extension::Comment.into(), &[b"gifstitch"])?;
                self.gif_enc.get_or_insert(enc)
            }
            Some(ref mut enc) => enc,
        };

        enc.write_lzw_pre_encoded_frame(&frame)?;
        Ok(())
    }

    fn finish(&mut self) -> GifResult<()> {
        if let Some(enc) = self.gif_enc.take() {
            let mut writer = enc.into_inner()?;
            writer.flush()?;
        }
        Ok(())
    }

    fn written_bytes(&self) -> u64 {
        self.written.get()
    }
}
