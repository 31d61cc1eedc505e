// Generator configuration.
//
// `GeneratorConfig` gathers every tunable the `generate` binary uses: the
// rng seed, tempo, Markov walk parameters, LFSR parameters and an optional
// scale to fold melodies into. It is loaded from JSON; every field has a
// default, so a config file only needs the keys it changes. Command-line
// flags are applied on top of the loaded values by main.rs.

use crate::error::Result;
use crate::markov::WalkModel;
use crate::note::PitchClass;
use crate::scale::{Scale, ScaleInstance};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Starting pitch class, also the tonic of `scale`.
    pub tonic: String,
    pub octave: i32,
    /// Semitones added to every generated frequency.
    pub transpose: i32,
    /// Number of notes, including the starting note.
    pub length: usize,
    pub min_octave: i32,
    pub max_octave: i32,
    /// Score steps per note when rendering.
    pub note_steps: usize,
    /// Optional JSON `WalkModel` replacing the built-in chord-tone model.
    pub model: Option<PathBuf>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            tonic: "C".to_string(),
            octave: 4,
            transpose: 0,
            length: 16,
            min_octave: 2,
            max_octave: 6,
            note_steps: 2,
            model: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfsrConfig {
    pub width: u32,
    /// Output bits (score steps) to generate.
    pub length: usize,
    /// Register seed; drawn from the generator rng when absent.
    pub seed: Option<u32>,
}

impl Default for LfsrConfig {
    fn default() -> Self {
        LfsrConfig {
            width: 5,
            length: 32,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for `SongRng`; a random seed is chosen (and logged) when absent.
    pub seed: Option<u64>,
    pub tempo_bpm: u16,
    pub walk: WalkConfig,
    pub lfsr: LfsrConfig,
    /// Scale name such as "major" or "pentatonic minor".
    pub scale: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: None,
            tempo_bpm: 120,
            walk: WalkConfig::default(),
            lfsr: LfsrConfig::default(),
            scale: None,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The walk model: loaded from `walk.model` if set, otherwise the
    /// chord-tone model over `min_octave..=max_octave`.
    pub fn walk_model(&self) -> Result<WalkModel> {
        match &self.walk.model {
            Some(path) => WalkModel::load(path),
            None => WalkModel::with_octave_range(self.walk.min_octave, self.walk.max_octave),
        }
    }

    /// The configured scale rooted on the walk tonic, if any.
    pub fn scale_instance(&self) -> Result<Option<ScaleInstance>> {
        let Some(name) = &self.scale else {
            return Ok(None);
        };
        let scale: Scale = name.parse()?;
        let tonic = PitchClass::parse(&self.walk.tonic)?;
        Ok(Some(ScaleInstance::new(scale, tonic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_config_serializes() {
        let config = GeneratorConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "seed": 42,
            "walk": { "tonic": "Eb", "length": 8 },
            "scale": "dorian"
        }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.tempo_bpm, 120);
        assert_eq!(config.walk.tonic, "Eb");
        assert_eq!(config.walk.length, 8);
        assert_eq!(config.walk.octave, 4);
        assert_eq!(config.lfsr, LfsrConfig::default());
        let scale = config.scale_instance().unwrap().unwrap();
        assert_eq!(scale.scale, Scale::Dorian);
        assert_eq!(scale.tonic, PitchClass::DSharp);
    }

    #[test]
    fn walk_model_uses_octave_range() {
        let mut config = GeneratorConfig::default();
        config.walk.min_octave = 3;
        config.walk.max_octave = 5;
        let model = config.walk_model().unwrap();
        assert_eq!(model.octaves().clamp(9), 5);
        config.walk.min_octave = 7;
        assert!(config.walk_model().is_err());
        config.walk.min_octave = -2_000_000_000;
        config.walk.max_octave = 2_000_000_000;
        assert!(matches!(
            config.walk_model(),
            Err(Error::InvalidOctaveRange { .. })
        ));
    }

    #[test]
    fn walk_model_file_is_checked_on_load() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("aleatoric_model_{}.json", std::process::id()));
        let bad = dir.join(format!("aleatoric_bad_model_{}.json", std::process::id()));
        let default_model = WalkModel::default_model();
        std::fs::write(&good, serde_json::to_string(&default_model).unwrap()).unwrap();
        let octaves = serde_json::to_string(default_model.octaves()).unwrap();
        std::fs::write(&bad, format!(r#"{{"notes": [[1, 0], [0, 1]], "octaves": {octaves}}}"#))
            .unwrap();

        let mut config = GeneratorConfig::default();
        config.walk.model = Some(good.clone());
        let loaded = config.walk_model();
        config.walk.model = Some(bad.clone());
        let rejected = config.walk_model();
        std::fs::remove_file(&good).unwrap();
        std::fs::remove_file(&bad).unwrap();

        assert_eq!(loaded.unwrap().notes().num_rows(), 12);
        assert!(matches!(rejected, Err(Error::Json(_))), "{rejected:?}");
    }

    #[test]
    fn bad_scale_or_tonic_is_an_error() {
        let mut config = GeneratorConfig {
            scale: Some("bebop".to_string()),
            ..GeneratorConfig::default()
        };
        assert!(config.scale_instance().is_err());
        config.scale = Some("major".to_string());
        config.walk.tonic = "H".to_string();
        assert!(config.scale_instance().is_err());
        assert!(GeneratorConfig::default().scale_instance().unwrap().is_none());
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("aleatoric_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "tempo_bpm": 96, "lfsr": { "width": 7 } }"#).unwrap();
        let config = GeneratorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.tempo_bpm, 96);
        assert_eq!(config.lfsr.width, 7);
        assert_eq!(config.lfsr.length, 32);
        assert!(GeneratorConfig::load(Path::new("/nonexistent/aleatoric.json")).is_err());
    }
}
