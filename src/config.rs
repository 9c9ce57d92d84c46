//! Wastesort configuration. Settings are layered from an optional TOML file
//! and the process environment (`PORT`, `CONFIDENCE_THRESHOLD`, ...). A value
//! that does not parse falls back to its default, with a warning.

use crate::classifier::SamplingPolicy;
use anyhow::Result;
use ::config::{Config, Environment, File};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,actix_server=info";

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Best confidence below which a result is reported as "no waste detected"
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.70;

pub const DEFAULT_MIN_DETECTIONS: usize = 2;
pub const DEFAULT_MAX_DETECTIONS: usize = 4;
pub const DEFAULT_CONFIDENCE_MIN: f64 = 0.40;
pub const DEFAULT_CONFIDENCE_MAX: f64 = 0.99;
pub const DEFAULT_CONFIDENCE_PRECISION: u32 = 2;

/// Fake inference latency
pub const DEFAULT_INFERENCE_DELAY_MS: u64 = 1000;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Read from `BIND_HOST`; a shell's `HOST` is not the bind address
    pub bind_host: String,
    pub port: u16,
    pub confidence_threshold: f64,

    /// When false every sampled detection is reported
    pub threshold_gating: bool,
    pub min_detections: usize,
    pub max_detections: usize,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub confidence_precision: u32,
    pub inference_delay_ms: u64,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_host: DEFAULT_BIND_HOST.into(),
            port: DEFAULT_PORT,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            threshold_gating: true,
            min_detections: DEFAULT_MIN_DETECTIONS,
            max_detections: DEFAULT_MAX_DETECTIONS,
            confidence_min: DEFAULT_CONFIDENCE_MIN,
            confidence_max: DEFAULT_CONFIDENCE_MAX,
            confidence_precision: DEFAULT_CONFIDENCE_PRECISION,
            inference_delay_ms: DEFAULT_INFERENCE_DELAY_MS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    /// Read settings from `file` (if given) and the environment. Environment
    /// variables win over the file.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }
        let raw = builder.add_source(Environment::default()).build()?;

        Ok(Settings::from_config(&raw))
    }

    /// Pull every known key out of `raw`, falling back to defaults
    pub fn from_config(raw: &Config) -> Self {
        let defaults = Settings::default();

        let mut settings = Settings {
            bind_host: raw
                .get_string("bind_host")
                .unwrap_or_else(|_| defaults.bind_host.clone()),
            port: lookup(raw, "port", defaults.port, |p| *p != 0),
            confidence_threshold: lookup(
                raw,
                "confidence_threshold",
                defaults.confidence_threshold,
                is_probability,
            ),
            threshold_gating: lookup_flag(raw, "threshold_gating", defaults.threshold_gating),
            min_detections: lookup(raw, "min_detections", defaults.min_detections, |n| *n >= 1),
            max_detections: lookup(raw, "max_detections", defaults.max_detections, |n| *n >= 1),
            confidence_min: lookup(raw, "confidence_min", defaults.confidence_min, is_probability),
            confidence_max: lookup(raw, "confidence_max", defaults.confidence_max, is_probability),
            confidence_precision: lookup(
                raw,
                "confidence_precision",
                defaults.confidence_precision,
                |p| *p <= 6,
            ),
            inference_delay_ms: lookup(
                raw,
                "inference_delay_ms",
                defaults.inference_delay_ms,
                |_| true,
            ),
            max_upload_bytes: lookup(
                raw,
                "max_upload_bytes",
                defaults.max_upload_bytes,
                |n| *n > 0,
            ),
        };

        if settings.min_detections > settings.max_detections {
            warn!(
                min = settings.min_detections,
                max = settings.max_detections,
                "detection range is empty, using defaults"
            );
            settings.min_detections = defaults.min_detections;
            settings.max_detections = defaults.max_detections;
        }

        if settings.confidence_min > settings.confidence_max {
            warn!(
                min = settings.confidence_min,
                max = settings.confidence_max,
                "confidence range is empty, using defaults"
            );
            settings.confidence_min = defaults.confidence_min;
            settings.confidence_max = defaults.confidence_max;
        }

        settings
    }

    pub fn sampling_policy(&self) -> SamplingPolicy {
        SamplingPolicy {
            detections: self.min_detections..=self.max_detections,
            confidence: self.confidence_min..=self.confidence_max,
            precision: self.confidence_precision,
            threshold: self.threshold_gating.then_some(self.confidence_threshold),
        }
    }

    pub fn inference_delay(&self) -> Duration {
        Duration::from_millis(self.inference_delay_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn is_probability(p: &f64) -> bool {
    (0.0..=1.0).contains(p)
}

/// Parse `key`, or warn and use `default` if it is malformed or rejected by
/// `valid`. A missing key is silently the default.
fn lookup<T>(raw: &Config, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(value) = raw.get_string(key) else {
        return default;
    };

    match value.trim().parse::<T>() {
        Ok(parsed) if valid(&parsed) => parsed,
        Ok(parsed) => {
            warn!(key, value = %parsed, default = %default, "setting out of range, using default");
            default
        }
        Err(e) => {
            warn!(key, value = %value, default = %default, "malformed setting ({e}), using default");
            default
        }
    }
}

fn lookup_flag(raw: &Config, key: &str, default: bool) -> bool {
    let Ok(value) = raw.get_string(key) else {
        return default;
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(key, value = %value, default, "malformed flag, using default");
            default
        }
    }
}
