// Scale tables and pitch snapping.
//
// Each `Scale` is a set of semitone offsets from its tonic. A
// `ScaleInstance` pins a scale to a tonic pitch class and answers the
// questions generators ask about MIDI pitches: is it in the scale, which
// degree is it, and what is the nearest in-scale pitch.
//
// Used by the CLI to fold Markov walks into a key (`--scale`) and by
// render.rs when quantising generated frequencies.

use crate::error::{Error, Result};
use crate::note::PitchClass;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    Chromatic,
    /// Ionian.
    Major,
    /// Aeolian.
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    PentatonicMajor,
    PentatonicMinor,
    Blues,
    PhrygianDominant,
    DoubleHarmonic,
    HungarianMinor,
    Hirajoshi,
    Iwato,
}

impl Scale {
    pub const ALL: [Scale; 18] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::Minor,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Locrian,
        Scale::HarmonicMinor,
        Scale::MelodicMinor,
        Scale::PentatonicMajor,
        Scale::PentatonicMinor,
        Scale::Blues,
        Scale::PhrygianDominant,
        Scale::DoubleHarmonic,
        Scale::HungarianMinor,
        Scale::Hirajoshi,
        Scale::Iwato,
    ];

    /// Semitones above the tonic for each degree, ascending within one octave.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::PentatonicMajor => &[0, 2, 4, 7, 9],
            Scale::PentatonicMinor => &[0, 3, 5, 7, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
            Scale::PhrygianDominant => &[0, 1, 4, 5, 7, 8, 10],
            Scale::DoubleHarmonic => &[0, 1, 4, 5, 7, 8, 11],
            Scale::HungarianMinor => &[0, 2, 3, 6, 7, 8, 11],
            Scale::Hirajoshi => &[0, 4, 6, 7, 11],
            Scale::Iwato => &[0, 1, 5, 6, 10],
        }
    }

    /// Membership mask indexed by semitones above the tonic.
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in self.intervals() {
            pcs[interval as usize] = true;
        }
        pcs
    }
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let scale = match key.as_str() {
            "chromatic" => Scale::Chromatic,
            "major" | "ionian" => Scale::Major,
            "minor" | "aeolian" | "naturalminor" => Scale::Minor,
            "dorian" => Scale::Dorian,
            "phrygian" => Scale::Phrygian,
            "lydian" => Scale::Lydian,
            "mixolydian" => Scale::Mixolydian,
            "locrian" => Scale::Locrian,
            "harmonicminor" => Scale::HarmonicMinor,
            "melodicminor" => Scale::MelodicMinor,
            "pentatonicmajor" | "pentmajor" | "majorpentatonic" => Scale::PentatonicMajor,
            "pentatonicminor" | "pentminor" | "minorpentatonic" => Scale::PentatonicMinor,
            "blues" => Scale::Blues,
            "phrygiandominant" => Scale::PhrygianDominant,
            "doubleharmonic" | "flamenco" => Scale::DoubleHarmonic,
            "hungarianminor" => Scale::HungarianMinor,
            "hirajoshi" => Scale::Hirajoshi,
            "iwato" => Scale::Iwato,
            _ => return Err(Error::UnknownScale(s.to_string())),
        };
        Ok(scale)
    }
}

/// A scale rooted on a specific pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleInstance {
    pub scale: Scale,
    pub tonic: PitchClass,
}

impl ScaleInstance {
    pub fn new(scale: Scale, tonic: PitchClass) -> Self {
        ScaleInstance { scale, tonic }
    }

    fn offset(&self, pitch: u8) -> usize {
        (pitch as usize + 12 - self.tonic.index()) % 12
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.scale.pitch_classes()[self.offset(pitch)]
    }

    /// Zero-based scale degree of a pitch, or `None` if it is out of scale.
    pub fn scale_degree(&self, pitch: u8) -> Option<usize> {
        let offset = self.offset(pitch) as u8;
        self.scale.intervals().iter().position(|&iv| iv == offset)
    }

    /// MIDI pitch of `degree` counted from the tonic in `octave`. Degrees past
    /// the top of the scale continue into higher octaves.
    pub fn degree_to_pitch(&self, degree: usize, octave: i32) -> Option<u8> {
        let intervals = self.scale.intervals();
        let extra_octaves = i64::try_from(degree / intervals.len()).ok()?;
        let interval = i64::from(intervals[degree % intervals.len()]);
        let midi_octave = i64::from(octave).checked_add(1 + extra_octaves)?;
        let pitch = midi_octave
            .checked_mul(12)?
            .checked_add(self.tonic.index() as i64 + interval)?;
        u8::try_from(pitch).ok().filter(|&p| p <= 127)
    }

    /// Nearest in-scale pitch; ties go to the lower pitch.
    pub fn snap(&self, pitch: u8) -> u8 {
        if self.contains(pitch) {
            return pitch;
        }
        for distance in 1u8..=6 {
            if pitch >= distance && self.contains(pitch - distance) {
                return pitch - distance;
            }
            let above = pitch.saturating_add(distance);
            if above <= 127 && self.contains(above) {
                return above;
            }
        }
        pitch
    }

    /// All in-scale pitches in `low..=high`.
    pub fn pitches_in_range(&self, low: u8, high: u8) -> Vec<u8> {
        (low..=high).filter(|&p| self.contains(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scale_starts_on_the_tonic_and_ascends() {
        for scale in Scale::ALL {
            let iv = scale.intervals();
            assert_eq!(iv[0], 0, "{scale:?}");
            assert!(iv.windows(2).all(|w| w[0] < w[1]), "{scale:?} not ascending");
            assert!(*iv.last().unwrap() < 12, "{scale:?} spans past an octave");
        }
    }

    #[test]
    fn c_major_membership() {
        let c_major = ScaleInstance::new(Scale::Major, PitchClass::C);
        for pitch in [60, 62, 64, 65, 67, 69, 71, 72] {
            assert!(c_major.contains(pitch), "{pitch}");
        }
        for pitch in [61, 63, 66, 68, 70] {
            assert!(!c_major.contains(pitch), "{pitch}");
        }
    }

    #[test]
    fn degrees_in_d_dorian() {
        let d_dorian = ScaleInstance::new(Scale::Dorian, PitchClass::D);
        assert_eq!(d_dorian.scale_degree(62), Some(0));
        assert_eq!(d_dorian.scale_degree(69), Some(4));
        assert_eq!(d_dorian.scale_degree(63), None);
        assert_eq!(d_dorian.degree_to_pitch(0, 4), Some(62));
        assert_eq!(d_dorian.degree_to_pitch(7, 4), Some(74));
        assert_eq!(d_dorian.degree_to_pitch(0, 10), None);
        assert_eq!(d_dorian.degree_to_pitch(0, i32::MAX), None);
        assert_eq!(d_dorian.degree_to_pitch(3, i32::MIN), None);
        assert_eq!(d_dorian.degree_to_pitch(usize::MAX, 4), None);
    }

    #[test]
    fn snapping_prefers_nearest_then_lower() {
        let c_major = ScaleInstance::new(Scale::Major, PitchClass::C);
        assert_eq!(c_major.snap(60), 60);
        assert_eq!(c_major.snap(61), 60);
        assert_eq!(c_major.snap(66), 65);
        let c_pent = ScaleInstance::new(Scale::PentatonicMinor, PitchClass::C);
        assert_eq!(c_pent.snap(61), 60);
        assert_eq!(c_pent.snap(62), 63);
        // F# sits between F and G.
        assert_eq!(c_pent.snap(66), 65);
        assert_eq!(c_pent.snap(0), 0);
    }

    #[test]
    fn parses_scale_names() {
        assert_eq!("Harmonic Minor".parse::<Scale>().unwrap(), Scale::HarmonicMinor);
        assert_eq!("ionian".parse::<Scale>().unwrap(), Scale::Major);
        assert_eq!("pent-minor".parse::<Scale>().unwrap(), Scale::PentatonicMinor);
        assert!("bebop".parse::<Scale>().is_err());
    }

    #[test]
    fn pitches_in_range_filters() {
        let a_minor = ScaleInstance::new(Scale::Minor, PitchClass::A);
        assert_eq!(a_minor.pitches_in_range(57, 64), vec![57, 59, 60, 62, 64]);
    }
}
