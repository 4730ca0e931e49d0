use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be at most {max}, got {value}")]
    TooLarge { name: &'static str, value: f64, max: f64 },
}

/// Well beyond any human speaking speed.
pub const MAX_WORDS_PER_MINUTE: f64 = 1_000.0;
pub const MAX_RATE: f64 = 10.0;
pub const MAX_SHADOW_GAP_MS: u64 = 60_000;

/// Pacing of speech and of the estimated highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Assumed speaking speed at rate 1.0, used by the fallback ticker.
    pub words_per_minute: f64,
    pub normal_rate: f64,
    pub slow_rate: f64,
    /// Pause between the two shadowing passes.
    pub shadow_gap_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150.0,
            normal_rate: 1.0,
            slow_rate: 0.7,
            shadow_gap_ms: 1000,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("wordsPerMinute", self.words_per_minute),
            ("normalRate", self.normal_rate),
            ("slowRate", self.slow_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        for (name, value, max) in [
            ("wordsPerMinute", self.words_per_minute, MAX_WORDS_PER_MINUTE),
            ("normalRate", self.normal_rate, MAX_RATE),
            ("slowRate", self.slow_rate, MAX_RATE),
            ("shadowGapMs", self.shadow_gap_ms as f64, MAX_SHADOW_GAP_MS as f64),
        ] {
            if value > max {
                return Err(ConfigError::TooLarge { name, value, max });
            }
        }
        Ok(())
    }

    /// Estimated time per word at `rate`, in milliseconds.
    pub fn word_interval_ms(&self, rate: f64) -> f64 {
        60_000.0 / (self.words_per_minute * rate)
    }
}
