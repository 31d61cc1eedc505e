// Rendering generated material into scores.
//
// Generators work in frequencies (walks, triads) or bits (step patterns);
// the score works in MIDI pitches on an eighth-note grid. These helpers do
// the conversion: frequencies are rounded to the nearest MIDI key and
// optionally snapped into a scale, chords are split into one part per
// chord tone, and step patterns become drum hits that loop to the length
// of the score. `walk_drums` stacks the drum kit used under random walks.
//
// Frequencies outside the MIDI range are rendered as rests with a warning.

use crate::chord::AxisChord;
use crate::error::Result;
use crate::lfsr::Lfsr;
use crate::note::frequency_to_midi;
use crate::rhythm::StepPattern;
use crate::scale::ScaleInstance;
use crate::score::{DRUM_CHANNEL, STEPS_PER_BAR, Score};
use log::warn;
use rand::Rng;

/// General MIDI program used for melodies (lead 1, square).
pub const LEAD_PROGRAM: u8 = 80;
/// General MIDI program used for chord parts (pad 2, warm).
pub const PAD_PROGRAM: u8 = 89;

const MELODY_VELOCITY: u8 = 90;
const CHORD_VELOCITY: u8 = 70;

/// Common General MIDI drum keys.
pub mod drums {
    pub const KICK: u8 = 36;
    pub const SNARE: u8 = 38;
    pub const CLOSED_HAT: u8 = 42;
    pub const OPEN_HAT: u8 = 46;
}

fn to_pitch(hz: f64, scale: Option<&ScaleInstance>) -> Option<u8> {
    let Some(pitch) = frequency_to_midi(hz) else {
        warn!("{hz:.2} Hz is outside the MIDI range; rendering a rest");
        return None;
    };
    Some(scale.map_or(pitch, |s| s.snap(pitch)))
}

/// Add a melodic part playing `frequencies` in order, each held for
/// `note_steps` steps. Notes past the end of the score are dropped.
pub fn add_melody_part(
    score: &mut Score,
    name: &str,
    channel: u8,
    frequencies: &[f64],
    note_steps: usize,
    scale: Option<&ScaleInstance>,
) -> usize {
    let part = score.add_part(name, channel, LEAD_PROGRAM);
    let note_steps = note_steps.max(1);
    for (i, &hz) in frequencies.iter().enumerate() {
        let step = i * note_steps;
        if step >= score.num_steps {
            break;
        }
        if let Some(pitch) = to_pitch(hz, scale) {
            score.hold_note(part, step, note_steps, pitch, MELODY_VELOCITY);
        }
    }
    part
}

/// A score holding a single melody sized to fit every note.
pub fn melody_score(frequencies: &[f64], note_steps: usize, scale: Option<&ScaleInstance>) -> Score {
    let note_steps = note_steps.max(1);
    let mut score = Score::new(frequencies.len() * note_steps);
    add_melody_part(&mut score, "melody", 0, frequencies, note_steps, scale);
    score
}

/// A score with one part per chord tone (root, third, fifth), each chord
/// held for `chord_steps` steps.
pub fn progression_score(chords: &[AxisChord], chord_steps: usize) -> Score {
    let chord_steps = chord_steps.max(1);
    let mut score = Score::new(chords.len() * chord_steps);
    let parts = ["root", "third", "fifth"].map(|name| score.add_part(name, 1, PAD_PROGRAM));
    for (i, chord) in chords.iter().enumerate() {
        for (&part, hz) in parts.iter().zip(chord.chord.frequencies()) {
            if let Some(pitch) = to_pitch(hz, None) {
                score.hold_note(part, i * chord_steps, chord_steps, pitch, CHORD_VELOCITY);
            }
        }
    }
    score
}

/// Add a drum part striking `key` on every on-step of `pattern`. The
/// pattern loops to cover the whole score.
pub fn percussion_part(
    score: &mut Score,
    name: &str,
    key: u8,
    pattern: &StepPattern,
    velocity: u8,
) -> usize {
    let part = score.add_part(name, DRUM_CHANNEL, 0);
    if pattern.is_empty() {
        return part;
    }
    for step in 0..score.num_steps {
        if pattern.is_on(step % pattern.len()) {
            score.set_note(part, step, key, velocity);
        }
    }
    part
}

/// Kick on beats one and three, a `lfsr_width`-bit LFSR snare gated to the
/// off-beats, random closed hats, and an open hat on the last eighth of
/// every bar.
pub fn walk_drums(score: &mut Score, rng: &mut impl Rng, lfsr_width: u32) -> Result<()> {
    let snare = StepPattern::from_register(
        &mut Lfsr::with_random_seed(lfsr_width, &mut *rng)?,
        score.num_steps,
    );
    let offbeats = StepPattern::every(2, 2, 1);
    let open = StepPattern::every(STEPS_PER_BAR, STEPS_PER_BAR, STEPS_PER_BAR - 1);
    let closed = StepPattern::new((0..STEPS_PER_BAR).map(|i| !open.is_on(i)).collect());
    let hats = StepPattern::bernoulli(rng, STEPS_PER_BAR, 0.6).gate(&closed);

    percussion_part(score, "kick", drums::KICK, &StepPattern::every(STEPS_PER_BAR, 4, 0), 110);
    percussion_part(score, "snare", drums::SNARE, &snare.gate(&offbeats), 80);
    percussion_part(score, "hat", drums::CLOSED_HAT, &hats, 60);
    percussion_part(score, "open hat", drums::OPEN_HAT, &open, 70);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::axis_progression;
    use crate::note::{PitchClass, frequency};
    use crate::scale::Scale;
    use aleatoric_prng::SongRng;

    #[test]
    fn melody_notes_land_on_the_grid() {
        let freqs = [
            frequency("A", 4, 0).unwrap(),
            frequency("C", 5, 0).unwrap(),
            frequency("E", 5, 0).unwrap(),
        ];
        let score = melody_score(&freqs, 2, None);
        assert_eq!(score.num_steps, 6);
        assert_eq!(score.sounding_pitch(0, 0), Some(69));
        assert_eq!(score.sounding_pitch(0, 1), Some(69));
        assert!(score.cell(0, 2).attack);
        assert_eq!(score.sounding_pitch(0, 2), Some(72));
        assert_eq!(score.sounding_pitch(0, 5), Some(76));
    }

    #[test]
    fn out_of_range_frequencies_become_rests() {
        let score = melody_score(&[1.0, 440.0, 1.0e6], 1, None);
        assert_eq!(score.vertical_slice(0), vec![None]);
        assert_eq!(score.vertical_slice(1), vec![Some(69)]);
        assert_eq!(score.vertical_slice(2), vec![None]);
    }

    #[test]
    fn melody_snaps_into_scale() {
        let c_major = ScaleInstance::new(Scale::Major, PitchClass::C);
        // C#4 and F#4 are out of C major.
        let freqs = [frequency("C#", 4, 0).unwrap(), frequency("F#", 4, 0).unwrap()];
        let score = melody_score(&freqs, 1, Some(&c_major));
        assert_eq!(score.sounding_pitch(0, 0), Some(60));
        assert_eq!(score.sounding_pitch(0, 1), Some(65));
    }

    #[test]
    fn progression_has_a_part_per_chord_tone() {
        let chords = axis_progression(&mut SongRng::new(4), "C", 4, 0).unwrap();
        let score = progression_score(&chords, 4);
        assert_eq!(score.parts.len(), 3);
        assert_eq!(score.num_steps, 16);
        for (i, chord) in chords.iter().enumerate() {
            let root = frequency_to_midi(chord.chord.root).unwrap();
            assert_eq!(score.sounding_pitch(0, i * 4), Some(root));
            assert!(score.cell(0, i * 4).attack);
            assert!(!score.cell(0, i * 4 + 3).attack);
        }
    }

    #[test]
    fn percussion_loops_the_pattern() {
        let mut score = Score::new(16);
        let kick = percussion_part(&mut score, "kick", drums::KICK, &StepPattern::every(8, 4, 0), 100);
        assert_eq!(score.parts[kick].channel, DRUM_CHANNEL);
        let hits: Vec<usize> = (0..16).filter(|&s| score.cell(kick, s).attack).collect();
        assert_eq!(hits, vec![0, 4, 8, 12]);
        let empty = percussion_part(&mut score, "none", drums::SNARE, &StepPattern::default(), 100);
        assert!((0..16).all(|s| score.sounding_pitch(empty, s).is_none()));
    }

    #[test]
    fn walk_drums_stack_four_voices() {
        let mut score = Score::new(32);
        let mut rng = SongRng::new(6);
        walk_drums(&mut score, &mut rng, 5).unwrap();
        let names: Vec<&str> = score.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["kick", "snare", "hat", "open hat"]);
        assert!(score.parts.iter().all(|p| p.channel == DRUM_CHANNEL));

        let hits = |part: usize| -> Vec<usize> {
            (0..score.num_steps).filter(|&s| score.cell(part, s).attack).collect()
        };
        assert_eq!(hits(0), (0..32).step_by(4).collect::<Vec<_>>());
        assert!(hits(1).iter().all(|s| s % 2 == 1));
        assert!(hits(2).iter().all(|s| s % 8 != 7));
        assert_eq!(hits(3), vec![7, 15, 23, 31]);
        assert_eq!(score.sounding_pitch(3, 15), Some(drums::OPEN_HAT));

        assert!(walk_drums(&mut Score::new(8), &mut rng, 40).is_err());
    }
}
