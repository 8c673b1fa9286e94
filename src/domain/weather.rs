use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Clear,
    Rain,
    Storm,
}

impl WeatherKind {
    /// Fixed sampling order for the weighted roulette.
    pub const ALL: [WeatherKind; 3] = [WeatherKind::Clear, WeatherKind::Rain, WeatherKind::Storm];

    #[must_use]
    pub fn is_raining(self) -> bool {
        matches!(self, WeatherKind::Rain | WeatherKind::Storm)
    }

    #[must_use]
    pub fn is_thundering(self) -> bool {
        self == WeatherKind::Storm
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WeatherKind::Clear => "clear",
            WeatherKind::Rain => "rain",
            WeatherKind::Storm => "storm",
        }
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub clear: f64,
    pub rain: f64,
    pub storm: f64,
}

/// Selection weights per weather kind.
///
/// Construction rejects negative or non-finite weights and tables with fewer
/// than two positive entries, so a "different from current" draw always
/// terminates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightSpec", into = "WeightSpec")]
pub struct WeightTable {
    clear: f64,
    rain: f64,
    storm: f64,
}

impl WeightTable {
    pub fn new(clear: f64, rain: f64, storm: f64) -> Result<Self, ConfigError> {
        for (kind, weight) in [
            (WeatherKind::Clear, clear),
            (WeatherKind::Rain, rain),
            (WeatherKind::Storm, storm),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { kind, weight });
            }
        }
        let table = Self { clear, rain, storm };
        let positive = table.positive_kinds();
        if positive < 2 {
            return Err(ConfigError::TooFewWeatherKinds { positive });
        }
        Ok(table)
    }

    #[must_use]
    pub fn weight(&self, kind: WeatherKind) -> f64 {
        match kind {
            WeatherKind::Clear => self.clear,
            WeatherKind::Rain => self.rain,
            WeatherKind::Storm => self.storm,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.clear + self.rain + self.storm
    }

    #[must_use]
    pub fn positive_kinds(&self) -> usize {
        WeatherKind::ALL
            .iter()
            .filter(|kind| self.weight(**kind) > 0.0)
            .count()
    }

    /// Cumulative-weight roulette over [`WeatherKind::ALL`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> WeatherKind {
        let r = rng.random_range(0.0..self.total());
        let mut cumulative = 0.0;
        for kind in WeatherKind::ALL {
            let weight = self.weight(kind);
            cumulative += weight;
            if weight > 0.0 && cumulative >= r {
                return kind;
            }
        }
        // Rounding can leave `cumulative` a hair under `r`.
        WeatherKind::ALL
            .iter()
            .rev()
            .copied()
            .find(|kind| self.weight(*kind) > 0.0)
            .unwrap_or(WeatherKind::Storm)
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            clear: 5.0,
            rain: 2.0,
            storm: 2.0,
        }
    }
}

impl TryFrom<WeightSpec> for WeightTable {
    type Error = ConfigError;

    fn try_from(spec: WeightSpec) -> Result<Self, Self::Error> {
        Self::new(spec.clear, spec.rain, spec.storm)
    }
}

impl From<WeightTable> for WeightSpec {
    fn from(table: WeightTable) -> Self {
        Self {
            clear: table.clear,
            rain: table.rain,
            storm: table.storm,
        }
    }
}

/// Draws the next weather kind, redrawing until it differs from `current`.
///
/// With no current weather the first draw is taken as-is.
pub fn choose_next<R: Rng + ?Sized>(
    current: Option<WeatherKind>,
    weights: &WeightTable,
    rng: &mut R,
) -> WeatherKind {
    loop {
        let candidate = weights.sample(rng);
        if Some(candidate) != current {
            return candidate;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherChanged {
    pub from: Option<WeatherKind>,
    pub to: WeatherKind,
    pub at: DateTime<Utc>,
}

impl WeatherChanged {
    #[must_use]
    pub fn new(from: Option<WeatherKind>, to: WeatherKind) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests;
