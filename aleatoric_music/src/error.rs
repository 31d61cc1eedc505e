// Error type shared by every module of the crate.
//
// Generation functions validate their inputs up front (note names, chord
// inversions, LFSR widths and seeds, transition rows) and report problems
// here instead of producing silent zeros or stale values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown note name '{0}'")]
    UnknownNoteName(String),

    #[error("unknown chord quality '{0}'")]
    UnknownChordQuality(String),

    #[error("invalid chord inversion {0} (expected 0, 1 or 2)")]
    InvalidInversion(u8),

    #[error("unsupported LFSR width {0} (expected 2..=16)")]
    UnsupportedLfsrWidth(u32),

    #[error("LFSR seed {seed:#x} is not a non-zero {width}-bit value")]
    InvalidLfsrSeed { seed: u32, width: u32 },

    #[error("transition row {row} is invalid: {reason}")]
    InvalidTransitionRow { row: usize, reason: String },

    #[error("octave range {min}..={max} is empty or too wide")]
    InvalidOctaveRange { min: i32, max: i32 },

    #[error("MIDI pitch {0} is outside 0..=127")]
    MidiOutOfRange(i64),

    #[error("unknown scale '{0}'")]
    UnknownScale(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
