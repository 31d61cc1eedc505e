// MIDI output from scores.
//
// Converts a Score into a Standard MIDI File (SMF format 1): track 0 holds
// the tempo, then one track per part carrying its name, a program change
// and the part's notes on the part's channel. Eighth-note steps map to
// `TICKS_PER_EIGHTH` ticks.
//
// Uses the `midly` crate for encoding.

use crate::error::Result;
use crate::score::{Part, Score};
use log::debug;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per eighth note (one score step).
pub const TICKS_PER_EIGHTH: u32 = TICKS_PER_QUARTER as u32 / 2;

/// Encode a score and write it to `path`.
pub fn write_midi(score: &Score, path: &Path) -> Result<()> {
    let bytes = encode(score)?;
    std::fs::write(path, &bytes)?;
    debug!("wrote {} bytes of MIDI to {}", bytes.len(), path.display());
    Ok(())
}

/// Encode a score as SMF bytes.
pub fn encode(score: &Score) -> Result<Vec<u8>> {
    let smf = score_to_smf(score);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a score to an in-memory SMF borrowing the part names.
pub fn score_to_smf(score: &Score) -> Smf<'_> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo_microseconds(score.tempo_bpm))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    for part in &score.parts {
        smf.tracks.push(part_track(part));
    }
    smf
}

/// Microseconds per quarter note. Tempos under 4 BPM do not fit the 24-bit
/// field and are written as the slowest tempo it can hold.
fn tempo_microseconds(tempo_bpm: u16) -> u24 {
    let micros = 60_000_000 / u32::from(tempo_bpm.max(1));
    u24::new(micros.min(u24::max_value().as_int()))
}

fn part_track(part: &Part) -> Track<'_> {
    let channel = u4::new(part.channel & 0x0F);
    let mut track: Track<'_> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(part.program & 0x7F),
                },
            },
        },
    ];

    let mut last_event_tick: u32 = 0;
    let mut note_on: Option<u8> = None;
    let mut push = |track: &mut Track<'_>, tick: u32, message: MidiMessage| {
        track.push(TrackEvent {
            delta: u28::new(tick - last_event_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_event_tick = tick;
    };
    let note_off = |key: u8| MidiMessage::NoteOff {
        key: u7::new(key & 0x7F),
        vel: u7::new(0),
    };

    for (step, cell) in part.cells.iter().enumerate() {
        if !cell.is_rest && !cell.attack {
            // Continuation of the sounding note.
            continue;
        }
        let tick = step as u32 * TICKS_PER_EIGHTH;
        if let Some(pitch) = note_on.take() {
            push(&mut track, tick, note_off(pitch));
        }
        if cell.attack {
            push(
                &mut track,
                tick,
                MidiMessage::NoteOn {
                    key: u7::new(cell.pitch & 0x7F),
                    vel: u7::new(cell.velocity.clamp(1, 127)),
                },
            );
            note_on = Some(cell.pitch);
        }
    }

    if let Some(pitch) = note_on {
        let end_tick = part.cells.len() as u32 * TICKS_PER_EIGHTH;
        push(&mut track, end_tick, note_off(pitch));
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}
