use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cli::Cli,
    domain::weather::{WeatherKind, WeightTable},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight for {kind} must be a finite non-negative number, got {weight}")]
    InvalidWeight { kind: WeatherKind, weight: f64 },
    #[error("weather weights need at least two positive entries, found {positive}")]
    TooFewWeatherKinds { positive: usize },
    #[error("{name} range is empty or inverted: [{min}, {max}]")]
    EmptyRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("reading config {} failed", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {} failed", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Deepest recursion the bolt generator accepts; segment count grows
/// exponentially with depth.
pub const MAX_BOLT_DEPTH: u32 = 10;

/// Longest grace period a retiring rain emitter may linger for.
pub const MAX_TEARDOWN_GRACE_SECS: f32 = 10.0;

/// Inclusive integer range, e.g. hold duration in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn check(self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::EmptyRange {
                name,
                min: f64::from(self.min),
                max: f64::from(self.max),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn check(self, name: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(ConfigError::EmptyRange {
                name,
                min: f64::from(self.min),
                max: f64::from(self.max),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub height_offset: f32,
    pub smoothing: f32,
    pub park_height: f32,
    pub teardown_grace_secs: f32,
    pub ambient_volume: f32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            height_offset: 40.0,
            smoothing: 0.15,
            park_height: 10_000.0,
            teardown_grace_secs: 0.1,
            ambient_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoltConfig {
    pub segment_length: f32,
    pub segment_thickness: f32,
    pub max_depth: u32,
    pub continue_chance: f32,
    pub fork_chance: f32,
    pub max_deviation_deg: f32,
}

impl Default for BoltConfig {
    fn default() -> Self {
        Self {
            segment_length: 4.0,
            segment_thickness: 0.3,
            max_depth: 6,
            continue_chance: 0.7,
            fork_chance: 0.5,
            max_deviation_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeConfig {
    pub lifetime_secs: f32,
    pub fade_secs: f32,
    pub base_transparency: f32,
    pub crack_falloff: f32,
    pub rumble_falloff: f32,
    pub duck_radius: f32,
}

impl StrikeConfig {
    /// Elapsed time at which segments start fading out.
    #[must_use]
    pub fn fade_start_secs(&self) -> f32 {
        self.lifetime_secs - self.fade_secs
    }
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: 4.0,
            fade_secs: 0.5,
            base_transparency: 0.25,
            crack_falloff: 100.0,
            rumble_falloff: 150.0,
            duck_radius: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThunderConfig {
    pub interval_secs: IntRange,
    pub strikes_per_round: IntRange,
    pub spawn_radius: f32,
    pub spawn_height: FloatRange,
}

impl Default for ThunderConfig {
    fn default() -> Self {
        Self {
            interval_secs: IntRange::new(10, 20),
            strikes_per_round: IntRange::new(3, 7),
            spawn_radius: 20.0,
            spawn_height: FloatRange::new(10.0, 20.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub weights: WeightTable,
    pub hold_secs: IntRange,
    pub frame_hz: u32,
    pub seed: Option<u64>,
    pub rain: RainConfig,
    pub bolt: BoltConfig,
    pub strike: StrikeConfig,
    pub thunder: ThunderConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            hold_secs: IntRange::new(60, 180),
            frame_hz: 30,
            seed: None,
            rain: RainConfig::default(),
            bolt: BoltConfig::default(),
            strike: StrikeConfig::default(),
            thunder: ThunderConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reads the optional JSON file, layers CLI overrides on top and validates.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match cli.config.as_deref() {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        if let Some(seed) = cli.seed {
            config.seed = Some(seed);
        }
        if let Some(frame_hz) = cli.frame_hz {
            config.frame_hz = frame_hz;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = self.weights.positive_kinds();
        if positive < 2 {
            return Err(ConfigError::TooFewWeatherKinds { positive });
        }
        self.hold_secs.check("hold_secs")?;
        self.thunder.interval_secs.check("thunder.interval_secs")?;
        self.thunder.strikes_per_round.check("thunder.strikes_per_round")?;
        self.thunder.spawn_height.check("thunder.spawn_height")?;

        probability("rain.smoothing", self.rain.smoothing)?;
        probability("bolt.continue_chance", self.bolt.continue_chance)?;
        probability("bolt.fork_chance", self.bolt.fork_chance)?;
        probability("strike.base_transparency", self.strike.base_transparency)?;

        positive_f32("frame_hz", self.frame_hz as f32)?;
        positive_f32("bolt.segment_length", self.bolt.segment_length)?;
        positive_f32("strike.lifetime_secs", self.strike.lifetime_secs)?;
        positive_f32("strike.crack_falloff", self.strike.crack_falloff)?;
        positive_f32("strike.rumble_falloff", self.strike.rumble_falloff)?;
        within(
            "rain.teardown_grace_secs",
            f64::from(self.rain.teardown_grace_secs),
            0.0,
            f64::from(MAX_TEARDOWN_GRACE_SECS),
        )?;
        within(
            "bolt.max_depth",
            f64::from(self.bolt.max_depth),
            1.0,
            f64::from(MAX_BOLT_DEPTH),
        )?;
        if self.strike.fade_secs < 0.0 || self.strike.fade_secs > self.strike.lifetime_secs {
            return Err(ConfigError::EmptyRange {
                name: "strike.fade_secs",
                min: 0.0,
                max: f64::from(self.strike.lifetime_secs),
            });
        }
        Ok(())
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

fn within(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn positive_f32(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            name,
            value: f64::from(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.hold_secs, IntRange::new(60, 180));
        assert!((config.strike.fade_start_secs() - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"hold_secs": {{"min": 5, "max": 9}}, "strike": {{"duck_radius": 12.5}}}}"#
        )
        .unwrap();

        let config = SimConfig::from_path(file.path()).unwrap();
        assert_eq!(config.hold_secs, IntRange::new(5, 9));
        assert_eq!(config.strike.duck_radius, 12.5);
        assert_eq!(config.strike.rumble_falloff, 150.0);
        assert_eq!(config.weights, WeightTable::default());
    }

    #[test]
    fn single_weather_kind_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"weights": {{"clear": 1.0, "rain": 0.0, "storm": 0.0}}}}"#
        )
        .unwrap();

        let err = SimConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_runaway_grace_and_depth() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rain": {{"teardown_grace_secs": 1e30}}}}"#).unwrap();
        let config = SimConfig::from_path(file.path()).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                name: "rain.teardown_grace_secs",
                ..
            })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bolt": {{"max_depth": 4000000000}}}}"#).unwrap();
        let config = SimConfig::from_path(file.path()).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                name: "bolt.max_depth",
                ..
            })
        ));

        let mut config = SimConfig::default();
        config.bolt.max_depth = MAX_BOLT_DEPTH;
        config.rain.teardown_grace_secs = MAX_TEARDOWN_GRACE_SECS;
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn cli_overrides_seed_and_frame_rate() {
        let cli = Cli::parse_from(["weather-director", "--seed", "42", "--frame-hz", "60"]);
        let config = SimConfig::load(&cli).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.frame_hz, 60);
    }

    #[test]
    fn validate_rejects_bad_ranges_and_probabilities() {
        let mut config = SimConfig::default();
        config.hold_secs = IntRange::new(30, 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyRange {
                name: "hold_secs",
                ..
            })
        ));

        let mut config = SimConfig::default();
        config.bolt.fork_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability { .. })
        ));

        let mut config = SimConfig::default();
        config.strike.fade_secs = 9.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.rain.teardown_grace_secs = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                name: "rain.teardown_grace_secs",
                ..
            })
        ));

        let mut config = SimConfig::default();
        config.bolt.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.frame_hz = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));
    }
}
