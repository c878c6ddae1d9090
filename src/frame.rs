//! The shared pixel buffer and the sink that displays it.
//!
//! Every pattern draws into one [`FrameBuffer`]. Once the active pattern has
//! finished its tick, the render loop hands the buffer to a [`FrameSink`].

use crate::{Color, LED_COUNT};

/// One color per LED, in data-line order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<Color>,
}

impl FrameBuffer {
    /// A black frame covering every LED of the sculpture.
    pub fn new() -> Self {
        Self {
            pixels: vec![Color::BLACK; LED_COUNT],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, index: usize) -> Color {
        self.pixels[index]
    }

    /// Overwrite one pixel.
    pub fn set(&mut self, index: usize, color: Color) {
        self.pixels[index] = color;
    }

    /// Add `color` on top of a pixel; overlaps brighten instead of replacing.
    pub fn blend(&mut self, index: usize, color: Color) {
        self.pixels[index] = self.pixels[index] + color;
    }

    /// Turn one pixel off.
    pub fn erase(&mut self, index: usize) {
        self.pixels[index] = Color::BLACK;
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Color::BLACK);
    }

    /// Dim every pixel towards black by `amount / 256`.
    pub fn fade_to_black_by(&mut self, amount: u8) {
        for pixel in &mut self.pixels {
            *pixel = pixel.fade_to_black_by(amount);
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Number of pixels that are not black.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_black()).count()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Where finished frames go.
pub trait FrameSink {
    /// Push `frame` to the display.
    fn flush(&mut self, frame: &FrameBuffer);
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn flush(&mut self, frame: &FrameBuffer) {
        (**self).flush(frame);
    }
}

/// A sink for running without hardware: counts frames and periodically logs
/// how many pixels are lit.
#[derive(Debug)]
pub struct HeadlessSink {
    frames: u64,
    log_every: u64,
}

impl HeadlessSink {
    pub fn new(log_every: u64) -> Self {
        Self {
            frames: 0,
            log_every: log_every.max(1),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for HeadlessSink {
    fn flush(&mut self, frame: &FrameBuffer) {
        self.frames += 1;
        if self.frames % self.log_every == 0 {
            tracing::debug!(
                "Headless frame {}: {} of {} pixels lit",
                self.frames,
                frame.lit_count(),
                frame.len()
            );
        }
    }
}

/// Keeps a copy of every flushed frame.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub(crate) frames: Vec<FrameBuffer>,
}

#[cfg(test)]
impl FrameSink for RecordingSink {
    fn flush(&mut self, frame: &FrameBuffer) {
        self.frames.push(frame.clone());
    }
}
