//! Bit-level waveform encoding.
//!
//! Every data bit on the LED line is sent as one SPI byte. At the adapter clock the
//! high run of that byte becomes the pulse the LED driver samples: a short high run
//! reads as a 0, a long one as a 1.

/// Pulse byte for a logical 0 (short high)
pub const ZERO: u8 = 0b1110_0000;

/// Pulse byte for a logical 1 (long high)
pub const ONE: u8 = 0b1111_1000;

/// Pulse bytes emitted per channel byte
pub const PULSES_PER_BYTE: usize = 8;

/// Pulse sequence for one channel byte, most significant bit first
pub type ByteWaveform = [u8; PULSES_PER_BYTE];

static LOOKUP: [ByteWaveform; 256] = build_lookup();

const fn build_lookup() -> [ByteWaveform; 256] {
    let mut table = [[ZERO; PULSES_PER_BYTE]; 256];
    let mut value = 0;
    while value < 256 {
        let mut bit = 0;
        while bit < PULSES_PER_BYTE {
            if (value >> (7 - bit)) & 1 == 1 {
                table[value][bit] = ONE;
            }
            bit += 1;
        }
        value += 1;
    }
    table
}

/// Look up the pulse sequence for `value`
#[inline]
pub fn encode_byte(value: u8) -> &'static ByteWaveform {
    &LOOKUP[value as usize]
}
