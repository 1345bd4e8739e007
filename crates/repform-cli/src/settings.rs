//! Application configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `REPFORM_*` environment variables (`__` separates nested keys,
//! e.g. `REPFORM_LIVE__COOLDOWN_TICKS=45`).

use std::path::{Path, PathBuf};

use repform_core::{ExtractorConfig, DEFAULT_ALPHA, DEFAULT_MIN_FRAMES};
use repform_live::{frame_interval, LiveConfig, TierThresholds, DEFAULT_COOLDOWN_TICKS};
use repform_rules::Standards;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "REPFORM";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    pub extractor: ExtractorConfig,
    pub smoothing: SmoothingConfig,
    pub aggregation: AggregationConfig,
    pub live: LiveSettings,
    pub output: OutputConfig,
    pub standards: Standards,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub min_frames: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    /// Side-view posture ranges
    Range,
    /// Squat/generic rule policy
    Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    pub cooldown_ticks: u32,
    pub tiers: TierThresholds,
    pub speech_enabled: bool,
    pub scorer: ScorerKind,
    /// Replay pacing; 0 replays as fast as possible
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `analyze` persists reports; printing only when unset
    pub report_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            extractor: ExtractorConfig::planar(),
            smoothing: SmoothingConfig::default(),
            aggregation: AggregationConfig::default(),
            live: LiveSettings::default(),
            output: OutputConfig::default(),
            standards: Standards::default(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_frames: DEFAULT_MIN_FRAMES,
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            cooldown_ticks: DEFAULT_COOLDOWN_TICKS,
            tiers: TierThresholds::default(),
            speech_enabled: true,
            scorer: ScorerKind::Range,
            frame_rate: 0.0,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` (if given), then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_from(path, None)
    }

    fn load_from(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Reject settings no component could run with
    pub fn validate(&self) -> repform_core::Result<()> {
        self.standards.validate()?;
        self.live_config().validate()?;
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err(repform_core::Error::Config(format!(
                "smoothing.alpha must be in (0, 1], got {}",
                self.smoothing.alpha
            )));
        }
        frame_interval(self.live.frame_rate)?;
        Ok(())
    }

    pub fn live_config(&self) -> LiveConfig {
        LiveConfig {
            alpha: self.smoothing.alpha,
            cooldown_ticks: self.live.cooldown_ticks,
            tiers: self.live.tiers.clone(),
            extractor: self.extractor.clone(),
        }
    }
}
