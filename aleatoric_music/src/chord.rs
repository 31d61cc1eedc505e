// Triads, inversions and the axis progression.
//
// A "fifth chord" is a major triad (root, major third, perfect fifth) given
// as three frequencies. The inversion decides which chord tones move an
// octave relative to the root:
//
//   root position   third +4, fifth +7
//   first inversion third -8, fifth -5   (both tones below the root)
//   second inversion third +4, fifth -5  (fifth dropped below the root)
//
// The root itself never moves, so the root frequency is the same for every
// inversion of a chord. Inversions are a closed enum; integer selectors are
// validated through `TryFrom<u8>` rather than falling through to stale values.
//
// `ChordQuality` covers the wider chord vocabulary (minor, diminished,
// suspended, extended) for MIDI-pitch voicings, and `axis_progression` picks
// a rotation of I–V–vi–IV with random inversions from an injected rng.

use crate::error::{Error, Result};
use crate::note::{Note, PitchClass, freq_from_a0};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inversion {
    Root,
    First,
    Second,
}

impl Inversion {
    pub const ALL: [Inversion; 3] = [Inversion::Root, Inversion::First, Inversion::Second];

    /// Semitone offsets of (third, fifth) relative to the root.
    pub fn offsets(self) -> (i32, i32) {
        match self {
            Inversion::Root => (4, 7),
            Inversion::First => (-8, -5),
            Inversion::Second => (4, -5),
        }
    }

    /// Uniformly random inversion.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl TryFrom<u8> for Inversion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Inversion::ALL
            .get(value as usize)
            .copied()
            .ok_or(Error::InvalidInversion(value))
    }
}

/// Three chord-tone frequencies in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: f64,
    pub third: f64,
    pub fifth: f64,
}

impl Chord {
    /// Build a major triad whose root is `root_distance` semitones above A0.
    pub fn major_from_a0(root_distance: i64, inversion: Inversion) -> Self {
        let (third, fifth) = inversion.offsets();
        Chord {
            root: freq_from_a0(root_distance),
            third: freq_from_a0(root_distance + i64::from(third)),
            fifth: freq_from_a0(root_distance + i64::from(fifth)),
        }
    }

    pub fn frequencies(&self) -> [f64; 3] {
        [self.root, self.third, self.fifth]
    }
}

/// Major triad on a named root, transposed and inverted.
pub fn fifth_chord(name: &str, octave: i32, transpose: i32, inversion: Inversion) -> Result<Chord> {
    let root = Note::new(PitchClass::parse(name)?, octave);
    Ok(Chord::major_from_a0(
        root.semitones_from_a0() + i64::from(transpose),
        inversion,
    ))
}

/// Chord families with their stacked intervals up to the thirteenth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Augmented,
    Diminished,
    Dominant,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Semitones above the root: root, 3rd, 5th, 7th, 9th, 11th, 13th.
    /// Suspended chords stop at the fifth.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ChordQuality::Major => &[0, 4, 7, 11, 14, 17, 21],
            ChordQuality::Minor => &[0, 3, 7, 10, 14, 17, 20],
            ChordQuality::Augmented => &[0, 4, 8, 10, 15, 19, 23],
            ChordQuality::Diminished => &[0, 3, 6, 9, 14, 17, 20],
            ChordQuality::Dominant => &[0, 4, 7, 10, 13, 17, 20],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }
}

impl FromStr for ChordQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // "M" and "m" differ only in case, so match before lowercasing.
        match s {
            "M" => return Ok(ChordQuality::Major),
            "m" => return Ok(ChordQuality::Minor),
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "maj" | "major" => Ok(ChordQuality::Major),
            "min" | "minor" | "-" => Ok(ChordQuality::Minor),
            "aug" | "augmented" | "+" => Ok(ChordQuality::Augmented),
            "dim" | "diminished" | "o" => Ok(ChordQuality::Diminished),
            "dom" | "dominant" | "7" => Ok(ChordQuality::Dominant),
            "sus2" => Ok(ChordQuality::Sus2),
            "sus4" => Ok(ChordQuality::Sus4),
            _ => Err(Error::UnknownChordQuality(s.to_string())),
        }
    }
}

/// MIDI pitches of the first `size` chord tones of `quality` on `root`.
///
/// `size` is clamped to the tones the quality defines (3 for triads, 4 for
/// sevenths and so on).
pub fn chord_pitches(root: Note, quality: ChordQuality, size: usize) -> Result<Vec<u8>> {
    quality
        .intervals()
        .iter()
        .take(size.max(1))
        .map(|&interval| root.transposed(interval).to_midi())
        .collect()
}

/// One chord of an axis progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisChord {
    /// Position of the chord in the key: "I", "IV", "V" or "VI".
    pub numeral: &'static str,
    pub inversion: Inversion,
    pub chord: Chord,
}

impl fmt::Display for AxisChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<3} {:<7} {:>8.2} {:>8.2} {:>8.2}",
            self.numeral,
            format!("{:?}", self.inversion),
            self.chord.root,
            self.chord.third,
            self.chord.fifth
        )
    }
}

/// Four major triads on degrees I, IV, V and VI of the key, each with a
/// random inversion, in a random rotation of I–V–VI–IV.
pub fn axis_progression(
    rng: &mut impl Rng,
    name: &str,
    octave: i32,
    transpose: i32,
) -> Result<Vec<AxisChord>> {
    let tonic =
        Note::new(PitchClass::parse(name)?, octave).semitones_from_a0() + i64::from(transpose);
    let mut build = |numeral: &'static str, offset: i64| {
        let inversion = Inversion::random(&mut *rng);
        AxisChord {
            numeral,
            inversion,
            chord: Chord::major_from_a0(tonic + offset, inversion),
        }
    };
    let one = build("I", 0);
    let four = build("IV", 5);
    let five = build("V", 7);
    let six = build("VI", 9);

    let base = [one, five, six, four];
    let rotation = rng.random_range(0..base.len());
    debug!("axis progression in {name}{octave}{transpose:+}: rotation {rotation}");
    Ok((0..base.len()).map(|i| base[(i + rotation) % base.len()]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleatoric_prng::SongRng;
    use float_cmp::approx_eq;

    fn semitone_ratio(n: i32) -> f64 {
        2f64.powf(n as f64 / 12.0)
    }

    #[test]
    fn root_position_is_major_third_and_fifth() {
        for name in ["C", "F#", "Bb", "A"] {
            for transpose in [-3, 0, 5] {
                let chord = fifth_chord(name, 3, transpose, Inversion::Root).unwrap();
                assert!(approx_eq!(f64, chord.third / chord.root, semitone_ratio(4), epsilon = 1e-12));
                assert!(approx_eq!(f64, chord.fifth / chord.root, semitone_ratio(7), epsilon = 1e-12));
            }
        }
    }

    #[test]
    fn inversions_move_tones_by_octaves() {
        let root = fifth_chord("C", 4, 0, Inversion::Root).unwrap();
        let first = fifth_chord("C", 4, 0, Inversion::First).unwrap();
        let second = fifth_chord("C", 4, 0, Inversion::Second).unwrap();

        assert_eq!(root.root, first.root);
        assert_eq!(root.root, second.root);
        assert!(approx_eq!(f64, first.third * 2.0, root.third, epsilon = 1e-9));
        assert!(approx_eq!(f64, first.fifth * 2.0, root.fifth, epsilon = 1e-9));
        assert!(approx_eq!(f64, second.third, root.third, epsilon = 1e-9));
        assert!(approx_eq!(f64, second.fifth * 2.0, root.fifth, epsilon = 1e-9));
    }

    #[test]
    fn a_major_root() {
        let chord = fifth_chord("A", 4, 0, Inversion::Root).unwrap();
        assert_eq!(chord.root, 440.0);
        assert!(approx_eq!(f64, chord.third, 554.365_262, epsilon = 1e-5));
        assert!(approx_eq!(f64, chord.fifth, 659.255_114, epsilon = 1e-5));
    }

    #[test]
    fn inversion_selector_is_validated() {
        assert_eq!(Inversion::try_from(0).unwrap(), Inversion::Root);
        assert_eq!(Inversion::try_from(2).unwrap(), Inversion::Second);
        assert!(matches!(Inversion::try_from(3), Err(Error::InvalidInversion(3))));
    }

    #[test]
    fn extreme_octaves_and_transpositions_stay_total() {
        let high = fifth_chord("C", i32::MAX, i32::MAX, Inversion::First).unwrap();
        assert!(high.frequencies().iter().all(|hz| hz.is_infinite()));
        let low = fifth_chord("C", i32::MIN, i32::MIN, Inversion::Second).unwrap();
        assert_eq!(low.frequencies(), [0.0; 3]);
        let prog = axis_progression(&mut SongRng::new(1), "B", i32::MAX, i32::MAX).unwrap();
        assert_eq!(prog.len(), 4);
    }

    #[test]
    fn unknown_root_is_an_error() {
        assert!(fifth_chord("X", 4, 0, Inversion::Root).is_err());
    }

    #[test]
    fn chord_qualities_voice_as_midi() {
        let c4 = Note::new(PitchClass::C, 4);
        assert_eq!(chord_pitches(c4, ChordQuality::Major, 3).unwrap(), vec![60, 64, 67]);
        assert_eq!(chord_pitches(c4, ChordQuality::Minor, 3).unwrap(), vec![60, 63, 67]);
        assert_eq!(chord_pitches(c4, ChordQuality::Dominant, 4).unwrap(), vec![60, 64, 67, 70]);
        // Suspended chords have only three tones.
        assert_eq!(chord_pitches(c4, ChordQuality::Sus4, 7).unwrap(), vec![60, 65, 67]);
        let g9 = Note::new(PitchClass::G, 9);
        assert!(chord_pitches(g9, ChordQuality::Major, 3).is_err());
    }

    #[test]
    fn quality_names() {
        assert_eq!("M".parse::<ChordQuality>().unwrap(), ChordQuality::Major);
        assert_eq!("m".parse::<ChordQuality>().unwrap(), ChordQuality::Minor);
        assert_eq!("Dim".parse::<ChordQuality>().unwrap(), ChordQuality::Diminished);
        assert_eq!("sus2".parse::<ChordQuality>().unwrap(), ChordQuality::Sus2);
        assert!("quartal".parse::<ChordQuality>().is_err());
    }

    #[test]
    fn axis_progression_is_a_rotation() {
        let order = ["I", "V", "VI", "IV"];
        for seed in 0..50 {
            let mut rng = SongRng::new(seed);
            let prog = axis_progression(&mut rng, "C", 3, 0).unwrap();
            assert_eq!(prog.len(), 4);
            let start = order.iter().position(|&n| n == prog[0].numeral).unwrap();
            for (i, step) in prog.iter().enumerate() {
                assert_eq!(step.numeral, order[(start + i) % 4]);
            }
        }
    }

    #[test]
    fn axis_progression_roots_follow_the_key() {
        let mut rng = SongRng::new(3);
        let prog = axis_progression(&mut rng, "C", 3, 2).unwrap();
        let d3 = fifth_chord("D", 3, 0, Inversion::Root).unwrap().root;
        for step in &prog {
            let offset = match step.numeral {
                "I" => 0,
                "IV" => 5,
                "V" => 7,
                _ => 9,
            };
            assert!(approx_eq!(f64, step.chord.root, d3 * semitone_ratio(offset), epsilon = 1e-9));
        }
    }

    #[test]
    fn axis_progression_is_reproducible() {
        let a = axis_progression(&mut SongRng::new(11), "G", 3, 0).unwrap();
        let b = axis_progression(&mut SongRng::new(11), "G", 3, 0).unwrap();
        assert_eq!(a, b);
    }
}
