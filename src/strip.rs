use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::color::{Brightness, Color};
use crate::error::{Error, Result};
use crate::pixel_format::{encode_frame, ChannelOrder};
use crate::transport::{FrequencyClass, Transport};

/// Idle time the data line needs before the LEDs latch a frame
pub const MIN_FRAME_GAP: Duration = Duration::from_micros(50);

/// Bytes shown in the trace-level frame dump
const TRACE_DUMP_LEN: usize = 48;

/// A strip of addressable LEDs behind one transport.
///
/// Pixel colors are stored unscaled; brightness only affects what `show` sends.
/// `show` takes `&mut self`, so a shared strip needs an external lock.
pub struct Strip<T: Transport> {
    transport: T,
    pixels: Vec<Color>,
    order: ChannelOrder,
    brightness: Brightness,
    last_show: Option<Instant>,
}

impl<T: Transport> Strip<T> {
    /// Create a strip of `count` black pixels and configure `transport` for `frequency`
    pub fn new(
        count: usize,
        mut transport: T,
        order: ChannelOrder,
        frequency: FrequencyClass,
    ) -> Result<Self> {
        transport.configure(frequency)?;
        debug!(
            "Strip of {} pixels, {:?} order, {:?}",
            count, order, frequency
        );
        Ok(Strip {
            transport,
            pixels: vec![Color::BLACK; count],
            order,
            brightness: Brightness::FULL,
            last_show: None,
        })
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.pixels.len() {
            return Err(Error::Index {
                index,
                count: self.pixels.len(),
            });
        }
        Ok(())
    }

    pub fn set_pixel(&mut self, index: usize, color: Color) -> Result<()> {
        self.check_index(index)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// Set a pixel from channel values, which must each be in 0..=255
    pub fn set_pixel_rgb(&mut self, index: usize, r: i32, g: i32, b: i32) -> Result<()> {
        self.check_index(index)?;
        let color = Color::try_from_rgb(r, g, b)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// Set a pixel from a packed `0xRRGGBB` value
    pub fn set_pixel_color(&mut self, index: usize, value: u32) -> Result<()> {
        self.check_index(index)?;
        let color = Color::from_packed(value)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// Set every pixel to `color`
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, index: usize) -> Result<Color> {
        self.check_index(index)?;
        Ok(self.pixels[index])
    }

    /// Packed `0xRRGGBB` value of a pixel
    pub fn pixel_color(&self, index: usize) -> Result<u32> {
        self.pixel(index).map(Color::packed)
    }

    /// Snapshot of all pixels, unscaled
    pub fn pixels(&self) -> Vec<Color> {
        self.pixels.clone()
    }

    /// Takes effect on the next `show`
    pub fn set_brightness(&mut self, brightness: f64) -> Result<()> {
        self.brightness = Brightness::new(brightness)?;
        Ok(())
    }

    pub fn brightness(&self) -> f64 {
        self.brightness.value()
    }

    /// Send the current pixels to the strip.
    ///
    /// Blocks until at least [`MIN_FRAME_GAP`] has passed since the previous frame.
    /// Transport errors are returned as-is; the frame is not retried.
    pub fn show(&mut self) -> Result<()> {
        if let Some(last) = self.last_show {
            let elapsed = last.elapsed();
            if elapsed < MIN_FRAME_GAP {
                let wait = MIN_FRAME_GAP - elapsed;
                trace!("Waiting {:?} for latch", wait);
                thread::sleep(wait);
            }
        }

        self.transport.begin()?;
        let frame = encode_frame(&self.pixels, self.order, self.brightness);

        if log::log_enabled!(log::Level::Trace) {
            let hex: String = frame
                .iter()
                .take(TRACE_DUMP_LEN)
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            trace!("Frame head: {}", hex);
        }

        let sent = match self.transport.write(&frame) {
            Ok(()) => self.transport.end(),
            Err(e) => {
                // Leave the adapter idle so the caller can retry
                if let Err(end_err) = self.transport.end() {
                    warn!("Failed to end transaction after write error: {}", end_err);
                }
                Err(e)
            }
        };
        // Part of the frame may be on the wire even when the transport failed
        self.last_show = Some(Instant::now());
        sent?;

        debug!(
            "Showed {} pixels ({} bytes) at brightness {}",
            self.pixels.len(),
            frame.len(),
            self.brightness.value()
        );
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Swap in a different transport, keeping pixels and brightness. Returns the old one.
    ///
    /// The new transport is expected to be configured already.
    pub fn replace_transport(&mut self, transport: T) -> T {
        self.last_show = None;
        std::mem::replace(&mut self.transport, transport)
    }

    /// Close the transport and hand it back
    pub fn close(mut self) -> Result<T> {
        self.transport.close()?;
        Ok(self.transport)
    }
}
