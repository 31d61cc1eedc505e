// Aleatoric music toolkit
//
// Small deterministic building blocks for procedural music: equal-tempered
// note frequencies, major triads with inversions, maximal-length LFSR bit
// streams for rhythms, and a Markov walk over (pitch class, octave) states.
// Generated material is rendered into a step-grid score and written out as
// a Standard MIDI File.
//
// Architecture:
// - note.rs: Note names, frequencies relative to A0, MIDI conversions
// - chord.rs: Fifth chords with inversions, chord qualities, axis progression
// - lfsr.rs: Fibonacci LFSR with maximal-length taps for 2..=16 bits
// - markov.rs: Transition matrices, octave model and the melodic walker
// - scale.rs: Scale tables, degrees and pitch snapping
// - rhythm.rs: Step patterns from LFSRs, coin flips and pulses
// - score.rs: Eighth-note step grid of named parts
// - render.rs: Frequencies, chords and patterns into scores
// - midi.rs: SMF output from scores
// - config.rs: JSON generator configuration
// - error.rs: Crate error type
//
// All randomness comes from an injected `rand::Rng` (normally
// `aleatoric_prng::SongRng`), so every result is reproducible from a seed.

pub mod chord;
pub mod config;
pub mod error;
pub mod lfsr;
pub mod markov;
pub mod midi;
pub mod note;
pub mod render;
pub mod rhythm;
pub mod scale;
pub mod score;

pub use error::{Error, Result};
