//! Drive addressable RGB LED strips through an SPI-capable byte transport.
//!
//! Each color channel byte becomes eight pulse bytes (see [`waveform`]); a frame is
//! every pixel's channels, in wire order, written in one transaction by [`Strip::show`].

pub mod color;
pub mod error;
pub mod pixel_format;
pub mod strip;
pub mod transport;
pub mod waveform;

pub use color::{Brightness, Color};
pub use error::{Error, Result};
pub use pixel_format::ChannelOrder;
pub use strip::Strip;
pub use transport::{CaptureTransport, FrequencyClass, SerialTransport, Transport};
