use crate::session::TrackingPolicy;
use std::time::Duration;

/// Most decimal places written for a motion value; beyond this f64 has no digits left.
pub const MAX_PRECISION: usize = 17;

/// Smallest frame time that still shows up in `Frame Time: {:.6}`.
const MIN_FRAME_TIME_S: f64 = 0.0000005;

/// Output settings for the BVH writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Seconds per frame written to `Frame Time:`.
    pub frame_time_s: f64,
    /// Decimal places for motion values. The writer caps this at [`MAX_PRECISION`].
    pub precision: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            frame_time_s: 1.0 / 30.0,
            precision: 2,
        }
    }
}

/// Settings for the background recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Frames buffered between the sensor and the recorder thread.
    pub queue_capacity: usize,
    /// How often the recorder thread wakes to check its stop flag.
    pub poll_interval: Duration,
    pub policy: TrackingPolicy,
    pub export: ExportConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            poll_interval: Duration::from_millis(100),
            policy: TrackingPolicy::FirstTracked,
            export: ExportConfig::default(),
        }
    }
}

impl RecorderConfig {
    /// Defaults overridden by `MOCAP_*` environment variables.
    ///
    /// - `MOCAP_QUEUE_CAPACITY`: frame queue length (> 0)
    /// - `MOCAP_POLL_MS`: stop-flag poll interval in milliseconds (> 0)
    /// - `MOCAP_TRACKING_POLICY`: `first` | `closest`
    /// - `MOCAP_FRAME_TIME`: seconds per frame (at least 0.0000005)
    /// - `MOCAP_PRECISION`: decimal places (capped at [`MAX_PRECISION`])
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let queue_capacity = read_parsed(&lookup, "MOCAP_QUEUE_CAPACITY", defaults.queue_capacity)
            .max(1);
        let poll_ms = read_parsed(&lookup, "MOCAP_POLL_MS", defaults.poll_interval.as_millis() as u64)
            .max(1);

        let policy = match read_string(&lookup, "MOCAP_TRACKING_POLICY", "first").as_str() {
            "first" => TrackingPolicy::FirstTracked,
            "closest" => TrackingPolicy::ClosestTracked,
            other => {
                log::warn!(
                    "Unknown MOCAP_TRACKING_POLICY='{}', using first (supported: first|closest)",
                    other
                );
                TrackingPolicy::FirstTracked
            }
        };

        let mut frame_time_s =
            read_parsed(&lookup, "MOCAP_FRAME_TIME", defaults.export.frame_time_s);
        if !(frame_time_s.is_finite() && frame_time_s >= MIN_FRAME_TIME_S) {
            log::warn!("Ignoring MOCAP_FRAME_TIME={} (rounds to zero)", frame_time_s);
            frame_time_s = defaults.export.frame_time_s;
        }

        let mut precision = read_parsed(&lookup, "MOCAP_PRECISION", defaults.export.precision);
        if precision > MAX_PRECISION {
            log::warn!(
                "MOCAP_PRECISION={} out of range, using {}",
                precision,
                MAX_PRECISION
            );
            precision = MAX_PRECISION;
        }

        Self {
            queue_capacity,
            poll_interval: Duration::from_millis(poll_ms),
            policy,
            export: ExportConfig {
                frame_time_s,
                precision,
            },
        }
    }
}

fn read_parsed<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Invalid {}='{}', using {}", name, raw, default);
                default
            }
        },
        None => default,
    }
}

fn read_string<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
