use std::str::FromStr;

use serde::Deserialize;

use crate::color::{Brightness, Color};
use crate::error::Error;
use crate::waveform::{encode_byte, PULSES_PER_BYTE};

/// Encoded bytes per pixel (3 channels, 8 pulses each)
pub const BYTES_PER_PIXEL: usize = 3 * PULSES_PER_BYTE;

/// Order in which a pixel's channels go out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ChannelOrder {
    /// Most strips expect green first
    #[default]
    #[serde(rename = "GRB")]
    Grb,
    #[serde(rename = "RGB")]
    Rgb,
}

impl ChannelOrder {
    /// Rearrange `(r, g, b)` into wire order
    fn arrange(self, (r, g, b): (u8, u8, u8)) -> [u8; 3] {
        match self {
            ChannelOrder::Grb => [g, r, b],
            ChannelOrder::Rgb => [r, g, b],
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_uppercase().as_str() {
            "GRB" => Ok(ChannelOrder::Grb),
            "RGB" => Ok(ChannelOrder::Rgb),
            _ => Err(Error::Range(format!("unknown pixel format {:?}", s))),
        }
    }
}

/// Append the waveform of already-scaled channels to `out`
fn push_channels(out: &mut Vec<u8>, channels: (u8, u8, u8), order: ChannelOrder) {
    for channel in order.arrange(channels) {
        out.extend_from_slice(encode_byte(channel));
    }
}

/// Encode one pixel at full brightness
pub fn encode_pixel(color: Color, order: ChannelOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(BYTES_PER_PIXEL);
    push_channels(&mut out, color.rgb(), order);
    out
}

/// Encode a whole frame: scale each pixel, then lay out its channel waveforms in array order
pub fn encode_frame(pixels: &[Color], order: ChannelOrder, brightness: Brightness) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * BYTES_PER_PIXEL);
    for pixel in pixels {
        push_channels(&mut out, pixel.scale(brightness), order);
    }
    out
}
