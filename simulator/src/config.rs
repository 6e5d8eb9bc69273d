use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    time::Duration,
};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Slowest pacing accepted: one simulated minute per wall-clock day.
const MAX_WALL_MINUTE_SECS: f64 = 86_400.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Tunables of the trip simulation. Every field has a default, so a config
/// file only needs to list what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock length of one simulated minute before the speed-up.
    pub minute_ms: f64,
    /// One simulated minute lasts `minute_ms / speed_factor` of wall time.
    pub speed_factor: f64,
    /// Upper bound of the driver-to-pickup phase, in simulated minutes.
    pub max_arrival_minutes: f64,
    pub tick_interval_ms: u64,
    /// Real-time pause between ARRIVED and the completion signal.
    pub completion_delay_ms: u64,
    pub cancel_delay_min_ms: u64,
    pub cancel_delay_max_ms: u64,
    pub cancel_probability: f64,
    /// Max offset, in degrees, of the driver's start around the pickup.
    pub driver_spawn_radius_deg: f64,
    /// Fixed seed for every random draw; entropy when unset.
    pub seed: Option<u64>,
    pub fare: FareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FareConfig {
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub average_speed_kmh: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            minute_ms: 1000.0,
            speed_factor: 1.5,
            max_arrival_minutes: 5.0,
            tick_interval_ms: 16,
            completion_delay_ms: 2_000,
            cancel_delay_min_ms: 5_000,
            cancel_delay_max_ms: 13_000,
            cancel_probability: 0.2,
            driver_spawn_radius_deg: 0.01,
            seed: None,
            fare: FareConfig::default(),
        }
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: 12.5,
            per_km_rate: 0.0,
            average_speed_kmh: 24.0,
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "speed_factor must be positive, got {}",
                self.speed_factor
            )));
        }
        if !self.minute_ms.is_finite() || self.minute_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "minute_ms must be positive, got {}",
                self.minute_ms
            )));
        }
        if self.wall_minute_secs() > MAX_WALL_MINUTE_SECS {
            return Err(ConfigError::Invalid(format!(
                "one simulated minute would last {}s of wall time, more than {MAX_WALL_MINUTE_SECS}s",
                self.wall_minute_secs()
            )));
        }
        if !(0.0..=1.0).contains(&self.cancel_probability) {
            return Err(ConfigError::Invalid(format!(
                "cancel_probability must be within [0, 1], got {}",
                self.cancel_probability
            )));
        }
        if self.cancel_delay_min_ms > self.cancel_delay_max_ms {
            return Err(ConfigError::Invalid(
                "cancel_delay_min_ms is larger than cancel_delay_max_ms".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be non-zero".into()));
        }
        if !self.driver_spawn_radius_deg.is_finite() || self.driver_spawn_radius_deg < 0.0 {
            return Err(ConfigError::Invalid(
                "driver_spawn_radius_deg must be a non-negative number".into(),
            ));
        }
        if self.fare.average_speed_kmh <= 0.0 {
            return Err(ConfigError::Invalid("average_speed_kmh must be positive".into()));
        }
        Ok(())
    }

    /// Wall-clock duration of one simulated minute, pinned to
    /// `Duration::MAX` for a config that failed validation.
    pub fn wall_minute(&self) -> Duration {
        Duration::try_from_secs_f64(self.wall_minute_secs()).unwrap_or(Duration::MAX)
    }

    fn wall_minute_secs(&self) -> f64 {
        self.minute_ms / self.speed_factor / 1000.0
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_pacing() {
        let config = SimulationConfig::default();
        let minute = config.wall_minute().as_secs_f64();
        assert!((minute - 1.0 / 1.5).abs() < 1e-9);
        assert_eq!(config.completion_delay(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let json = r#"{ "speed_factor": 3.0, "fare": { "per_km_rate": 2.0 } }"#;
        let config = SimulationConfig::from_reader(json.as_bytes()).expect("config");
        assert_eq!(config.speed_factor, 3.0);
        assert_eq!(config.fare.per_km_rate, 2.0);
        assert_eq!(config.fare.base_fare, 12.5);
        assert_eq!(config.cancel_delay_max_ms, 13_000);
    }

    #[test]
    fn rejects_non_positive_speed_factor() {
        let json = r#"{ "speed_factor": 0.0 }"#;
        let err = SimulationConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_pacing_that_overflows_a_duration() {
        for json in [r#"{ "minute_ms": 1e300 }"#, r#"{ "speed_factor": 1e-300 }"#] {
            let err = SimulationConfig::from_reader(json.as_bytes()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json} accepted");
        }
        let config = SimulationConfig {
            minute_ms: 1e300,
            ..Default::default()
        };
        assert_eq!(config.wall_minute(), Duration::MAX);
    }

    #[test]
    fn rejects_inverted_cancel_window() {
        let json = r#"{ "cancel_delay_min_ms": 9000, "cancel_delay_max_ms": 1000 }"#;
        assert!(SimulationConfig::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn seeded_rngs_repeat() {
        use rand::Rng;
        let config = SimulationConfig {
            seed: Some(7),
            ..Default::default()
        };
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }
}
