// Fibonacci linear-feedback shift register.
//
// Each step computes the feedback bit as the XOR parity of `state & mask`,
// shifts the register right by one and inserts the feedback bit at the top
// (bit `width - 1`). The feedback bit is also the step's output, so a
// register of width `w` emits a maximal-length sequence of period `2^w - 1`
// containing `2^(w-1)` ones per period.
//
// Tap masks come from the standard maximal-length table, which is written
// for left-to-right (top-bit-first) polynomials. Because this register
// shifts right, the table mask is mirrored within the register width; the
// mirrored polynomial is the reciprocal of a primitive polynomial and hence
// primitive too. Bit 0 is always tapped, which keeps the step invertible.
//
// Used by rhythm.rs for drum gates and by the `lfsr` CLI subcommand.

use crate::error::{Error, Result};
use log::trace;
use rand::Rng;

/// Narrowest supported register.
pub const MIN_WIDTH: u32 = 2;
/// Widest supported register.
pub const MAX_WIDTH: u32 = 16;

/// Maximal-length tap masks for widths 2..=16, top-bit-first.
const TAPS: [u32; 15] = [
    0x3, 0x6, 0xC, 0x14, 0x30, 0x60, 0xB8, 0x110, 0x240, 0x500, 0xE08, 0x1C80, 0x3802, 0x6000,
    0xD008,
];

/// Tap table entry for `width`, as listed in maximal-length tables.
pub fn taps_for_width(width: u32) -> Option<u32> {
    if (MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        Some(TAPS[(width - MIN_WIDTH) as usize])
    } else {
        None
    }
}

/// Mirror the low `width` bits of `mask`.
fn mirror(mask: u32, width: u32) -> u32 {
    mask.reverse_bits() >> (32 - width)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lfsr {
    state: u32,
    width: u32,
    /// Tap mask in right-shift form (bit 0 always set).
    mask: u32,
}

impl Lfsr {
    /// Create a register of `width` bits holding `seed`.
    ///
    /// The seed must be non-zero and fit in the register; the all-zero state
    /// is a fixed point and never leaves itself.
    pub fn new(seed: u32, width: u32) -> Result<Self> {
        let taps = taps_for_width(width).ok_or(Error::UnsupportedLfsrWidth(width))?;
        if seed == 0 || seed >> width != 0 {
            return Err(Error::InvalidLfsrSeed { seed, width });
        }
        Ok(Lfsr {
            state: seed,
            width,
            mask: mirror(taps, width),
        })
    }

    /// Register with a seed drawn uniformly from `1..2^width`.
    pub fn with_random_seed(width: u32, rng: &mut impl Rng) -> Result<Self> {
        if taps_for_width(width).is_none() {
            return Err(Error::UnsupportedLfsrWidth(width));
        }
        let seed = rng.random_range(1..(1u32 << width));
        Self::new(seed, width)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of steps before the state repeats: `2^width - 1`.
    pub fn period(&self) -> u32 {
        (1u32 << self.width) - 1
    }

    /// Advance one step and return the feedback bit.
    pub fn step(&mut self) -> bool {
        let feedback = (self.state & self.mask).count_ones() & 1;
        self.state = (self.state >> 1) | (feedback << (self.width - 1));
        trace!("lfsr step -> {:0width$b}", self.state, width = self.width as usize);
        feedback == 1
    }
}

impl Iterator for Lfsr {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        Some(self.step())
    }
}

/// `length` output bits of a `bit_width` register seeded with `seed`.
pub fn generate(seed: u32, bit_width: u32, length: usize) -> Result<Vec<bool>> {
    Ok(Lfsr::new(seed, bit_width)?.take(length).collect())
}

/// Render bits as a compact `x.x..x` string.
pub fn format_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { 'x' } else { '.' }).collect()
}
