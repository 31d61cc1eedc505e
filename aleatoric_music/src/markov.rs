// Markov random walk over (pitch class, octave) states.
//
// Two tables drive the walk:
// - a 12×12 note matrix: row = current pitch class, column = next pitch class.
//   The default is circulant and favours the tones of a major-seventh chord
//   built on the current note (unison, major third, fifth, major seventh),
//   with a little weight on the minor third, tritone and minor sixth.
// - an octave table: row = current octave, columns = down / stay / up. The
//   default leans back toward the middle of the configured octave range and
//   never steps past its edges.
//
// Pitch and octave are sampled independently at every step. Tables are
// stored as unnormalised weights in JSON (like corpus counts) and normalised
// on load, so rows need only be non-negative with positive mass.
//
// The walker itself holds no randomness; callers pass the run's rng to
// every step.

use crate::error::{Error, Result};
use crate::note::{Note, PitchClass, freq_from_a0};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default note weights by interval above the current pitch class.
const CHORD_TONE_WEIGHTS: [f64; 12] = [
    0.36, // unison
    0.0,
    0.0,
    0.03, // minor third
    0.20, // major third
    0.0,
    0.03, // tritone
    0.25, // perfect fifth
    0.03, // minor sixth
    0.0,
    0.0,
    0.20, // major seventh
];

/// Column order of the octave table.
const OCTAVE_DELTAS: [i32; 3] = [-1, 0, 1];

/// A row-stochastic transition table.
///
/// Built from non-negative weights; each row is normalised to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Validate and normalise a table of weights.
    ///
    /// Every row must have the same non-zero length, contain only finite
    /// non-negative weights and carry positive total weight.
    pub fn from_weights(weights: Vec<Vec<f64>>) -> Result<Self> {
        let columns = weights.first().map(Vec::len).unwrap_or(0);
        if columns == 0 {
            return Err(Error::InvalidTransitionRow {
                row: 0,
                reason: "table has no columns".to_string(),
            });
        }
        let mut rows = Vec::with_capacity(weights.len());
        for (i, row) in weights.into_iter().enumerate() {
            if row.len() != columns {
                return Err(Error::InvalidTransitionRow {
                    row: i,
                    reason: format!("expected {columns} columns, found {}", row.len()),
                });
            }
            if let Some(bad) = row.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(Error::InvalidTransitionRow {
                    row: i,
                    reason: format!("weight {bad} is not a finite non-negative number"),
                });
            }
            let total: f64 = row.iter().sum();
            if total <= 0.0 {
                return Err(Error::InvalidTransitionRow {
                    row: i,
                    reason: "row has no positive weight".to_string(),
                });
            }
            rows.push(row.into_iter().map(|w| w / total).collect());
        }
        Ok(TransitionMatrix { rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.rows[0].len()
    }

    /// Normalised probabilities out of state `from`.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.rows[from]
    }

    pub fn probability(&self, from: usize, to: usize) -> f64 {
        self.rows[from][to]
    }

    /// Pick the next column for row `from` using a uniform value in [0, 1).
    pub fn sample(&self, from: usize, rng_val: f64) -> usize {
        let row = &self.rows[from];
        let mut cumulative = 0.0;
        for (to, &p) in row.iter().enumerate() {
            cumulative += p;
            if cumulative > rng_val {
                return to;
            }
        }
        // Rounding can leave the cumulative sum just under 1.0.
        row.iter().rposition(|&p| p > 0.0).unwrap_or(row.len() - 1)
    }
}

impl TryFrom<Vec<Vec<f64>>> for TransitionMatrix {
    type Error = Error;

    fn try_from(weights: Vec<Vec<f64>>) -> Result<Self> {
        TransitionMatrix::from_weights(weights)
    }
}

impl From<TransitionMatrix> for Vec<Vec<f64>> {
    fn from(matrix: TransitionMatrix) -> Self {
        matrix.rows
    }
}

/// Most octaves an `OctaveModel` may span.
pub const MAX_OCTAVE_SPAN: i64 = 16;

/// Octave movement conditioned on the current octave.
///
/// Deserialization goes through the same checks as `new`, so a model read
/// from JSON always has one row per octave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOctaveModel")]
pub struct OctaveModel {
    min_octave: i32,
    max_octave: i32,
    /// One row per octave from `min_octave` to `max_octave`; columns are
    /// down, stay, up.
    table: TransitionMatrix,
}

#[derive(Deserialize)]
struct RawOctaveModel {
    min_octave: i32,
    max_octave: i32,
    table: TransitionMatrix,
}

impl TryFrom<RawOctaveModel> for OctaveModel {
    type Error = Error;

    fn try_from(raw: RawOctaveModel) -> Result<Self> {
        OctaveModel::new(raw.min_octave, raw.max_octave, raw.table)
    }
}

/// Number of octaves in `min..=max`, if it is between 1 and `MAX_OCTAVE_SPAN`.
fn octave_count(min_octave: i32, max_octave: i32) -> Result<usize> {
    let count = i64::from(max_octave) - i64::from(min_octave) + 1;
    if !(1..=MAX_OCTAVE_SPAN).contains(&count) {
        return Err(Error::InvalidOctaveRange {
            min: min_octave,
            max: max_octave,
        });
    }
    Ok(count as usize)
}

impl OctaveModel {
    /// Check that the table has one three-column row per octave in range.
    pub fn new(min_octave: i32, max_octave: i32, table: TransitionMatrix) -> Result<Self> {
        let expected = octave_count(min_octave, max_octave)?;
        if table.num_rows() != expected || table.num_columns() != 3 {
            return Err(Error::InvalidTransitionRow {
                row: 0,
                reason: format!(
                    "octave table for {min_octave}..={max_octave} must be {expected}×3, found {}×{}",
                    table.num_rows(),
                    table.num_columns()
                ),
            });
        }
        Ok(OctaveModel {
            min_octave,
            max_octave,
            table,
        })
    }

    /// Mostly stay; drift down more often near the top of the range and up
    /// more often near the bottom. Edge octaves cannot step outward.
    pub fn centered(min_octave: i32, max_octave: i32) -> Result<Self> {
        octave_count(min_octave, max_octave)?;
        Ok(Self::centered_unchecked(min_octave, max_octave))
    }

    fn centered_unchecked(min_octave: i32, max_octave: i32) -> Self {
        let span = (max_octave - min_octave).max(1) as f64;
        let rows = (min_octave..=max_octave)
            .map(|octave| {
                let height = (octave - min_octave) as f64 / span;
                let down = if octave == min_octave { 0.0 } else { 0.05 + 0.15 * height };
                let up = if octave == max_octave { 0.0 } else { 0.05 + 0.15 * (1.0 - height) };
                vec![down, 1.0 - down - up, up]
            })
            .collect();
        OctaveModel {
            min_octave,
            max_octave,
            table: TransitionMatrix { rows },
        }
    }

    pub fn min_octave(&self) -> i32 {
        self.min_octave
    }

    pub fn max_octave(&self) -> i32 {
        self.max_octave
    }

    pub fn table(&self) -> &TransitionMatrix {
        &self.table
    }

    pub fn clamp(&self, octave: i32) -> i32 {
        octave.clamp(self.min_octave, self.max_octave)
    }

    /// Sample the next octave from `octave` using a uniform value in [0, 1).
    pub fn next_octave(&self, octave: i32, rng_val: f64) -> i32 {
        let current = self.clamp(octave);
        let row = (current - self.min_octave) as usize;
        let delta = OCTAVE_DELTAS[self.table.sample(row, rng_val)];
        self.clamp(current.saturating_add(delta))
    }
}

/// Complete model for a melodic walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWalkModel")]
pub struct WalkModel {
    notes: TransitionMatrix,
    octaves: OctaveModel,
}

#[derive(Deserialize)]
struct RawWalkModel {
    notes: TransitionMatrix,
    octaves: OctaveModel,
}

impl TryFrom<RawWalkModel> for WalkModel {
    type Error = Error;

    fn try_from(raw: RawWalkModel) -> Result<Self> {
        WalkModel::new(raw.notes, raw.octaves)
    }
}

impl WalkModel {
    /// Chord-tone note matrix with a centred octave model over 2..=6.
    pub fn default_model() -> Self {
        WalkModel {
            notes: chord_tone_matrix(),
            octaves: OctaveModel::centered_unchecked(2, 6),
        }
    }

    /// Chord-tone note matrix with a centred octave model over the range.
    pub fn with_octave_range(min_octave: i32, max_octave: i32) -> Result<Self> {
        Self::new(chord_tone_matrix(), OctaveModel::centered(min_octave, max_octave)?)
    }

    pub fn new(notes: TransitionMatrix, octaves: OctaveModel) -> Result<Self> {
        if notes.num_rows() != 12 || notes.num_columns() != 12 {
            return Err(Error::InvalidTransitionRow {
                row: 0,
                reason: format!(
                    "note matrix must be 12×12, found {}×{}",
                    notes.num_rows(),
                    notes.num_columns()
                ),
            });
        }
        Ok(WalkModel { notes, octaves })
    }

    pub fn notes(&self) -> &TransitionMatrix {
        &self.notes
    }

    pub fn octaves(&self) -> &OctaveModel {
        &self.octaves
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// The default circulant note matrix built from `CHORD_TONE_WEIGHTS`.
pub fn chord_tone_matrix() -> TransitionMatrix {
    let total: f64 = CHORD_TONE_WEIGHTS.iter().sum();
    let rows = (0..12)
        .map(|from| {
            (0..12)
                .map(|to| CHORD_TONE_WEIGHTS[(to + 12 - from) % 12] / total)
                .collect()
        })
        .collect();
    TransitionMatrix { rows }
}

/// Stateful walker; the rng is supplied per call.
#[derive(Debug, Clone)]
pub struct MarkovWalker {
    model: WalkModel,
    state: Note,
}

impl MarkovWalker {
    pub fn new(model: WalkModel, start: Note) -> Self {
        MarkovWalker {
            model,
            state: start,
        }
    }

    pub fn state(&self) -> Note {
        self.state
    }

    pub fn model(&self) -> &WalkModel {
        &self.model
    }

    /// Move to the next (pitch class, octave) state and return it.
    pub fn step(&mut self, rng: &mut impl Rng) -> Note {
        let pitch_class = PitchClass::ALL[self
            .model
            .notes
            .sample(self.state.pitch_class.index(), rng.random::<f64>())];
        let octave = self
            .model
            .octaves
            .next_octave(self.state.octave, rng.random::<f64>());
        self.state = Note::new(pitch_class, octave);
        self.state
    }

    /// `length` states: the current state followed by `length - 1` steps.
    pub fn walk_states(&mut self, length: usize, rng: &mut impl Rng) -> Vec<Note> {
        let mut notes = Vec::with_capacity(length);
        if length == 0 {
            return notes;
        }
        notes.push(self.state);
        for _ in 1..length {
            notes.push(self.step(rng));
        }
        notes
    }
}

/// Frequencies of a `length`-note walk from `start_note` in `start_octave`,
/// transposed by `transpose` semitones. The first frequency is the start note.
pub fn walk(
    model: &WalkModel,
    start_note: &str,
    start_octave: i32,
    transpose: i32,
    length: usize,
    rng: &mut impl Rng,
) -> Result<Vec<f64>> {
    let start = Note::new(PitchClass::parse(start_note)?, start_octave);
    let mut walker = MarkovWalker::new(model.clone(), start);
    let notes = walker.walk_states(length, rng);
    debug!("walked {} notes from {start}, ending on {}", notes.len(), walker.state());
    Ok(notes
        .iter()
        .map(|n| freq_from_a0(n.semitones_from_a0() + i64::from(transpose)))
        .collect())
}
