// Aleatoric music generator: CLI entry point.
//
// Prints generated values to stdout and optionally renders them to MIDI.
//
// Usage:
//   cargo run -p aleatoric_music --bin generate -- <command> [args] [flags]
//
// Commands:
//   freq NOTE [OCTAVE] [--transpose N]
//   chord NOTE [OCTAVE] [--inversion 0|1|2] [--transpose N]
//   progression NOTE [OCTAVE] [--transpose N] [--repeats N]
//   lfsr [--width N] [--length N] [--lfsr-seed N]
//   walk [NOTE] [OCTAVE] [--transpose N] [--length N]
//
// Shared flags: --seed N, --config PATH, --midi PATH, --scale NAME,
// --tempo BPM. Set RUST_LOG=debug to see generation details.

use aleatoric_music::chord::{AxisChord, Inversion, axis_progression, fifth_chord};
use aleatoric_music::config::GeneratorConfig;
use aleatoric_music::lfsr::{Lfsr, format_bits};
use aleatoric_music::markov::walk;
use aleatoric_music::midi::write_midi;
use aleatoric_music::note::{Accidental, Note, frequency_to_midi, midi_name};
use aleatoric_music::render::{self, drums};
use aleatoric_music::rhythm::StepPattern;
use aleatoric_music::score::Score;
use aleatoric_music::{Error, Result};
use aleatoric_prng::SongRng;
use log::{debug, info};
use rand::Rng;
use std::path::Path;

const USAGE: &str = "usage: generate <freq|chord|progression|lfsr|walk> [args] \
[--seed N] [--config PATH] [--midi PATH] [--scale NAME] [--tempo BPM]";

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let Some(command) = args.get(1).filter(|s| !s.starts_with("--")) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    if let Err(e) = run(command, &args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: &str, args: &[String]) -> Result<()> {
    let mut config = match parse_flag::<String>(args, "--config") {
        Some(path) => GeneratorConfig::load(Path::new(&path))?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = parse_flag(args, "--seed") {
        config.seed = Some(seed);
    }
    if let Some(scale) = parse_flag(args, "--scale") {
        config.scale = Some(scale);
    }
    if let Some(tempo) = parse_flag(args, "--tempo") {
        config.tempo_bpm = tempo;
    }

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    info!("seed {seed}");
    let mut rng = SongRng::new(seed);

    let positional: Vec<&str> = args[2..]
        .iter()
        .take_while(|a| !a.starts_with("--"))
        .map(|a| a.as_str())
        .collect();
    let midi_path: Option<String> = parse_flag(args, "--midi");
    // A walk tonic given on the command line also roots the scale.
    if let Some(tonic) = positional.first().filter(|_| command == "walk") {
        config.walk.tonic = tonic.to_string();
    }

    let score = match command {
        "freq" => {
            run_freq(&positional, args)?;
            None
        }
        "chord" => Some(run_chord(&positional, args)?),
        "progression" => Some(run_progression(&positional, args, &mut rng)?),
        "lfsr" => Some(run_lfsr(&config, args, &mut rng)?),
        "walk" => {
            println!("Seed: {seed}");
            Some(run_walk(&config, &positional, args, &mut rng)?)
        }
        other => {
            eprintln!("unknown command '{other}'");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let (Some(path), Some(score)) = (midi_path, score) {
        let score = score.with_tempo(config.tempo_bpm);
        write_midi(&score, Path::new(&path))?;
        println!();
        print!("{}", score.summary());
        println!("Wrote {path}");
    }
    Ok(())
}

/// Note name and octave from the first two positional arguments.
fn note_args(positional: &[&str], default_name: &str, default_octave: i32) -> Result<(String, i32)> {
    let name = positional.first().copied().unwrap_or(default_name).to_string();
    let octave = match positional.get(1) {
        Some(text) => text
            .parse()
            .map_err(|_| Error::UnknownNoteName(format!("{name}{text}")))?,
        None => default_octave,
    };
    Ok((name, octave))
}

fn run_freq(positional: &[&str], args: &[String]) -> Result<()> {
    let (name, octave) = note_args(positional, "A", 4)?;
    let transpose = parse_flag(args, "--transpose").unwrap_or(0);
    let hz = aleatoric_music::note::frequency(&name, octave, transpose)?;
    let key = frequency_to_midi(hz)
        .map(|k| format!("MIDI {k} ({})", midi_name(k, Accidental::Sharp)))
        .unwrap_or_else(|| "outside MIDI range".to_string());
    println!("{name}{octave} {transpose:+}: {hz:.3} Hz, {key}");
    Ok(())
}

fn run_chord(positional: &[&str], args: &[String]) -> Result<Score> {
    let (name, octave) = note_args(positional, "C", 4)?;
    let transpose = parse_flag(args, "--transpose").unwrap_or(0);
    let inversion = Inversion::try_from(parse_flag::<u8>(args, "--inversion").unwrap_or(0))?;
    let chord = fifth_chord(&name, octave, transpose, inversion)?;
    println!(
        "{name}{octave} {transpose:+} {inversion:?}: root {:.3} Hz, third {:.3} Hz, fifth {:.3} Hz",
        chord.root, chord.third, chord.fifth
    );
    let axis = AxisChord {
        numeral: "I",
        inversion,
        chord,
    };
    Ok(render::progression_score(&[axis], 8))
}

fn run_progression(positional: &[&str], args: &[String], rng: &mut SongRng) -> Result<Score> {
    let (name, octave) = note_args(positional, "C", 3)?;
    let transpose = parse_flag(args, "--transpose").unwrap_or(0);
    let repeats: usize = parse_flag(args, "--repeats").unwrap_or(1);
    let mut chords = Vec::new();
    for _ in 0..repeats.max(1) {
        chords.extend(axis_progression(rng, &name, octave, transpose)?);
    }
    println!("{:<3} {:<7} {:>8} {:>8} {:>8}", "", "inv", "root", "third", "fifth");
    for chord in &chords {
        println!("{chord}");
    }
    Ok(render::progression_score(&chords, 8))
}

fn run_lfsr(config: &GeneratorConfig, args: &[String], rng: &mut SongRng) -> Result<Score> {
    let width = parse_flag(args, "--width").unwrap_or(config.lfsr.width);
    let length = parse_flag(args, "--length").unwrap_or(config.lfsr.length);
    let mut lfsr = match parse_flag(args, "--lfsr-seed").or(config.lfsr.seed) {
        Some(seed) => Lfsr::new(seed, width)?,
        None => Lfsr::with_random_seed(width, rng)?,
    };
    println!(
        "width {width}, seed {:#0w$b}, period {}",
        lfsr.state(),
        lfsr.period(),
        w = width as usize + 2
    );
    let pattern = StepPattern::from_register(&mut lfsr, length);
    println!("{}", format_bits(pattern.steps()));
    println!("density {:.3}", pattern.density());

    let mut score = Score::new(length);
    render::percussion_part(&mut score, "kick", drums::KICK, &StepPattern::every(8, 4, 0), 110);
    render::percussion_part(&mut score, "lfsr", drums::SNARE, &pattern, 90);
    Ok(score)
}

fn run_walk(
    config: &GeneratorConfig,
    positional: &[&str],
    args: &[String],
    rng: &mut SongRng,
) -> Result<Score> {
    let (tonic, octave) = note_args(positional, &config.walk.tonic, config.walk.octave)?;
    let transpose = parse_flag(args, "--transpose").unwrap_or(config.walk.transpose);
    let length = parse_flag(args, "--length").unwrap_or(config.walk.length);
    let model = config.walk_model()?;
    let scale = config.scale_instance()?;
    debug!(
        "walk model: octaves {}..={}",
        model.octaves().min_octave(),
        model.octaves().max_octave()
    );

    let frequencies = walk(&model, &tonic, octave, transpose, length, rng)?;
    for (i, hz) in frequencies.iter().enumerate() {
        let name = frequency_to_midi(*hz)
            .map(|k| scale.map_or(k, |s| s.snap(k)))
            .map(|k| Note::from_midi(k).to_string())
            .unwrap_or_else(|| "--".to_string());
        println!("{i:>3}  {hz:>9.3} Hz  {name}");
    }

    let note_steps = config.walk.note_steps.max(1);
    let mut score = render::melody_score(&frequencies, note_steps, scale.as_ref());
    render::walk_drums(&mut score, rng, config.lfsr.width)?;
    Ok(score)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
