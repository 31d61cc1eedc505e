// Note names, equal-tempered frequencies and MIDI numbers.
//
// Every pitch in the crate is measured in semitones from A0 (27.5 Hz), the
// lowest A on a piano. Octaves follow scientific pitch notation and change
// at C, so A4 sits 48 semitones above A0 (440 Hz) and C4 is MIDI key 60.
//
// Note names are a letter A–G in either case plus an optional accidental:
// `#` (sharp), `b` (flat) or `n` (natural). Enharmonic spellings such as
// `A#` and `Bb` parse to the same `PitchClass`.
//
// Used by chord.rs (triads), markov.rs (walk states) and render.rs (MIDI
// conversion of generated frequencies).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frequency of A0 in Hz; the reference pitch for every conversion.
pub const A0_HZ: f64 = 27.5;

/// MIDI key number of A0.
const A0_MIDI: i64 = 21;

/// Which spelling to prefer when naming a black key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accidental {
    #[default]
    Sharp,
    Flat,
}

/// The twelve pitch classes, C = 0 through B = 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C = 0,
    CSharp = 1,
    D = 2,
    DSharp = 3,
    E = 4,
    F = 5,
    FSharp = 6,
    G = 7,
    GSharp = 8,
    A = 9,
    ASharp = 10,
    B = 11,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class for any integer, wrapping modulo 12.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    /// Signed distance from A within the same octave: C = -9 … B = +2.
    pub fn offset_from_a(self) -> i32 {
        self.index() as i32 - PitchClass::A.index() as i32
    }

    pub fn transposed(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones.rem_euclid(12))
    }

    pub fn name(self, accidental: Accidental) -> &'static str {
        const SHARPS: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        const FLATS: [&str; 12] = [
            "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
        ];
        match accidental {
            Accidental::Sharp => SHARPS[self.index()],
            Accidental::Flat => FLATS[self.index()],
        }
    }

    /// Parse a bare note name such as `C`, `f#`, `Bb` or `En`.
    pub fn parse(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        let letter = chars
            .next()
            .ok_or_else(|| Error::UnknownNoteName(name.to_string()))?;
        let natural = match letter.to_ascii_uppercase() {
            'C' => PitchClass::C,
            'D' => PitchClass::D,
            'E' => PitchClass::E,
            'F' => PitchClass::F,
            'G' => PitchClass::G,
            'A' => PitchClass::A,
            'B' => PitchClass::B,
            _ => return Err(Error::UnknownNoteName(name.to_string())),
        };
        let shift = match (chars.next(), chars.next()) {
            (None, _) => 0,
            (Some('#'), None) => 1,
            (Some('b'), None) => -1,
            (Some('n'), None) => 0,
            _ => return Err(Error::UnknownNoteName(name.to_string())),
        };
        Ok(natural.transposed(shift))
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PitchClass::parse(s)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name(Accidental::Sharp))
    }
}

/// A pitch class in a specific octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Note {
            pitch_class,
            octave,
        }
    }

    /// Parse `C#4`, `Eb-1` or a bare `A` (octave 4 assumed).
    pub fn parse(text: &str) -> Result<Self> {
        let split = text
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-' || c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (name, octave) = text.split_at(split);
        let pitch_class = PitchClass::parse(name)?;
        let octave = if octave.is_empty() {
            4
        } else {
            octave
                .parse()
                .map_err(|_| Error::UnknownNoteName(text.to_string()))?
        };
        Ok(Note::new(pitch_class, octave))
    }

    /// Semitones above A0. Negative below it. Wide enough for any octave.
    pub fn semitones_from_a0(self) -> i64 {
        i64::from(self.pitch_class.offset_from_a()) + 12 * i64::from(self.octave)
    }

    pub fn frequency(self) -> f64 {
        freq_from_a0(self.semitones_from_a0())
    }

    /// MIDI key number, which may fall outside 0..=127 for extreme octaves.
    pub fn midi_number(self) -> i64 {
        self.semitones_from_a0() + A0_MIDI
    }

    pub fn to_midi(self) -> Result<u8> {
        let key = self.midi_number();
        u8::try_from(key)
            .ok()
            .filter(|&k| k <= 127)
            .ok_or(Error::MidiOutOfRange(key))
    }

    pub fn from_midi(key: u8) -> Self {
        let key = i32::from(key);
        Note::new(PitchClass::from_index(key), key.div_euclid(12) - 1)
    }

    /// Shift by `semitones`. The octave saturates at the bounds of `i32`.
    pub fn transposed(self, semitones: i32) -> Self {
        let absolute =
            self.pitch_class.index() as i64 + 12 * i64::from(self.octave) + i64::from(semitones);
        let octave = absolute
            .div_euclid(12)
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Note::new(self.pitch_class.transposed(semitones), octave)
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Note::parse(s)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Equal-tempered frequency `distance` semitones above A0. Distances far
/// outside the audible range give `0.0` or infinity.
pub fn freq_from_a0(distance: i64) -> f64 {
    A0_HZ * 2f64.powf(distance as f64 / 12.0)
}

/// Frequency of a named note, shifted by `transpose` semitones.
///
/// ```
/// use aleatoric_music::note::frequency;
/// assert_eq!(frequency("A", 4, 0).unwrap(), 440.0);
/// ```
pub fn frequency(name: &str, octave: i32, transpose: i32) -> Result<f64> {
    let note = Note::new(PitchClass::parse(name)?, octave);
    Ok(freq_from_a0(note.semitones_from_a0() + i64::from(transpose)))
}

pub fn midi_to_frequency(key: u8) -> f64 {
    freq_from_a0(i64::from(key) - A0_MIDI)
}

/// Nearest MIDI key for a frequency, or `None` outside the MIDI range.
pub fn frequency_to_midi(hz: f64) -> Option<u8> {
    if !hz.is_finite() || hz <= 0.0 {
        return None;
    }
    let key = (A0_MIDI as f64 + 12.0 * (hz / A0_HZ).log2()).round();
    if (0.0..=127.0).contains(&key) {
        Some(key as u8)
    } else {
        None
    }
}

/// Name a MIDI key as e.g. `C4`, `Eb3` or `F#5`.
pub fn midi_name(key: u8, accidental: Accidental) -> String {
    let note = Note::from_midi(key);
    format!("{}{}", note.pitch_class.name(accidental), note.octave)
}
