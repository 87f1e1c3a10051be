//! WS2812B strip, one pixel per hole, bit-banged over SPI MOSI.
//!
//! At 2.4 MHz each WS2812 bit becomes three SPI bits (`110` = 1,
//! `100` = 0), so one colour byte is three SPI bytes.  Pixels are sent in
//! GRB order followed by a low reset latch.
//!
//! Colours are staged in a frame buffer; nothing reaches the strip until
//! [`LedStrip::commit`].

use embedded_hal::spi::SpiBus;

use crate::app::commands::{HOLE_COUNT, Rgb};

const PIXELS: usize = HOLE_COUNT as usize;
/// ≥ 50 µs low at 2.4 MHz.
const RESET_BYTES: usize = 24;
const ENCODED_LEN: usize = PIXELS * 3 * 3 + RESET_BYTES;

#[derive(Debug)]
pub struct LedStrip {
    frame: [Rgb; PIXELS],
    dirty: bool,
}

impl Default for LedStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl LedStrip {
    pub fn new() -> Self {
        Self { frame: [Rgb::default(); PIXELS], dirty: false }
    }

    /// Stage one pixel; out-of-range holes are ignored.
    pub fn stage(&mut self, hole: u8, color: Rgb) {
        if let Some(px) = self.frame.get_mut(hole as usize) {
            *px = color;
            self.dirty = true;
        }
    }

    pub fn staged(&self, hole: u8) -> Option<Rgb> {
        self.frame.get(hole as usize).copied()
    }

    /// True when staged colours differ from what was last committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Push the whole frame to the strip.
    pub fn commit<S: SpiBus>(&mut self, spi: &mut S) -> Result<(), S::Error> {
        let mut out = [0u8; ENCODED_LEN];
        for (px, chunk) in self.frame.iter().zip(out.chunks_exact_mut(9)) {
            for (byte, slot) in [px.g, px.r, px.b].into_iter().zip(chunk.chunks_exact_mut(3)) {
                slot.copy_from_slice(&encode_byte(byte));
            }
        }
        spi.write(&out)?;
        spi.flush()?;
        self.dirty = false;
        Ok(())
    }
}

fn encode_byte(byte: u8) -> [u8; 3] {
    let mut bits = 0u32;
    for i in (0..8).rev() {
        let symbol = if byte & (1 << i) != 0 { 0b110 } else { 0b100 };
        bits = (bits << 3) | symbol;
    }
    let [_, hi, mid, lo] = bits.to_be_bytes();
    [hi, mid, lo]
}
