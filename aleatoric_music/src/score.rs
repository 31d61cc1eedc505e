// The score: a step grid that generated material is rendered into.
//
// Rows are parts (a melody, one row per chord tone, a drum voice) and
// columns are steps at eighth-note granularity. Each cell holds a MIDI
// pitch or a rest, plus an attack flag that separates a new note from the
// continuation of a held one.
//
// The grid is the source of truth for output. midi.rs derives a Standard
// MIDI File from it and `summary` prints it for the CLI; nothing reads
// either format back into a score.

use crate::note::{Accidental, midi_name};
use serde::{Deserialize, Serialize};

/// Steps per 4/4 bar.
pub const STEPS_PER_BAR: usize = 8;

/// MIDI channel reserved for percussion (channel 10, zero-based).
pub const DRUM_CHANNEL: u8 = 9;

/// A single cell in the score grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Sounding MIDI key; meaningless when `is_rest` is set.
    pub pitch: u8,
    pub is_rest: bool,
    /// Set on the step a note is struck. Steps that sustain the previous
    /// note of the part leave it clear, and so do rests.
    pub attack: bool,
    /// Strike velocity, carried on every step of a held note. Rests use 0.
    pub velocity: u8,
}

impl Cell {
    pub fn rest() -> Self {
        Cell {
            pitch: 0,
            is_rest: true,
            attack: false,
            velocity: 0,
        }
    }

    pub fn note(pitch: u8, attack: bool, velocity: u8) -> Self {
        Cell {
            pitch,
            is_rest: false,
            attack,
            velocity,
        }
    }
}

/// One row of the score, written to its own MIDI track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    /// Zero-based MIDI channel.
    pub channel: u8,
    /// General MIDI program number.
    pub program: u8,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Number of eighth-note steps in the piece.
    pub num_steps: usize,
    /// Quarter notes per minute.
    pub tempo_bpm: u16,
    pub parts: Vec<Part>,
}

impl Score {
    /// An empty score of `num_steps` steps at 120 BPM.
    pub fn new(num_steps: usize) -> Self {
        Score {
            num_steps,
            tempo_bpm: 120,
            parts: Vec::new(),
        }
    }

    pub fn with_tempo(mut self, tempo_bpm: u16) -> Self {
        self.tempo_bpm = tempo_bpm.max(1);
        self
    }

    /// Append a part of rests and return its index.
    pub fn add_part(&mut self, name: &str, channel: u8, program: u8) -> usize {
        self.parts.push(Part {
            name: name.to_string(),
            channel: channel & 0x0F,
            program: program & 0x7F,
            cells: vec![Cell::rest(); self.num_steps],
        });
        self.parts.len() - 1
    }

    pub fn part_index(&self, name: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.name == name)
    }

    pub fn cell(&self, part: usize, step: usize) -> &Cell {
        &self.parts[part].cells[step]
    }

    pub fn cell_mut(&mut self, part: usize, step: usize) -> &mut Cell {
        &mut self.parts[part].cells[step]
    }

    /// Set a note attack at (part, step).
    pub fn set_note(&mut self, part: usize, step: usize, pitch: u8, velocity: u8) {
        *self.cell_mut(part, step) = Cell::note(pitch & 0x7F, true, velocity & 0x7F);
    }

    /// Continue the note sounding at `step - 1` through `step`.
    /// Does nothing at step 0 or after a rest.
    pub fn extend_note(&mut self, part: usize, step: usize) {
        if step == 0 {
            return;
        }
        let prev = self.parts[part].cells[step - 1];
        if prev.is_rest {
            return;
        }
        *self.cell_mut(part, step) = Cell::note(prev.pitch, false, prev.velocity);
    }

    /// Attack at `step` held for `duration` steps, clipped to the score end.
    pub fn hold_note(&mut self, part: usize, step: usize, duration: usize, pitch: u8, velocity: u8) {
        if step >= self.num_steps || duration == 0 {
            return;
        }
        self.set_note(part, step, pitch, velocity);
        for s in step + 1..(step + duration).min(self.num_steps) {
            self.extend_note(part, s);
        }
    }

    /// Sounding pitch of a part at a step, or `None` while it rests.
    pub fn sounding_pitch(&self, part: usize, step: usize) -> Option<u8> {
        let cell = self.cell(part, step);
        if cell.is_rest { None } else { Some(cell.pitch) }
    }

    /// Sounding pitches of every part at a step.
    pub fn vertical_slice(&self, step: usize) -> Vec<Option<u8>> {
        (0..self.parts.len())
            .map(|p| self.sounding_pitch(p, step))
            .collect()
    }

    /// Compact text rendering: one line per part, note names with `-` for
    /// held steps, `.` for rests and `|` at bar lines.
    pub fn summary(&self) -> String {
        let width = self.parts.iter().map(|p| p.name.len()).max().unwrap_or(0);
        let mut out = String::new();
        for (index, part) in self.parts.iter().enumerate() {
            out.push_str(&format!("{:>width$}: ", part.name));
            for step in 0..self.num_steps {
                if step > 0 && step % STEPS_PER_BAR == 0 {
                    out.push('|');
                }
                let cell = self.cell(index, step);
                if cell.is_rest {
                    out.push('.');
                } else if cell.attack {
                    if part.channel == DRUM_CHANNEL {
                        out.push('x');
                    } else {
                        out.push_str(&midi_name(cell.pitch, Accidental::Sharp));
                    }
                } else {
                    out.push('-');
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn stats(&self) -> ScoreStats {
        let mut stats = ScoreStats {
            total_steps: self.num_steps,
            ..ScoreStats::default()
        };
        for part in &self.parts {
            for cell in &part.cells {
                if cell.is_rest {
                    stats.rests += 1;
                } else {
                    stats.sounding += 1;
                    if cell.attack {
                        stats.attacks += 1;
                    }
                }
            }
        }
        stats
    }
}

/// Counts over every cell of every part.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScoreStats {
    pub total_steps: usize,
    pub attacks: usize,
    pub sounding: usize,
    pub rests: usize,
}
