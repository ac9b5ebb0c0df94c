//! Worker configuration.

use posecap_models::FrameSize;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Synthetic camera frame rate
    pub fps: u32,
    /// Synthetic camera frame width in pixels
    pub frame_width: u32,
    /// Synthetic camera frame height in pixels
    pub frame_height: u32,
    /// Simulated detector latency per frame
    pub detection_latency: Duration,
    /// Give up if the session has not completed by then
    pub session_timeout: Duration,
    /// Frames the synthetic user holds a centered pose before turning
    pub front_hold_frames: u64,
    /// Degrees the synthetic head turns per detection
    pub turn_step_degrees: f64,
    /// Probability that the detector misses the face on a frame
    pub miss_rate: f64,
    /// Probability that a second face shows up on a frame
    pub crowd_rate: f64,
    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Print a Prometheus snapshot after the run
    pub print_metrics: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_width: 640,
            frame_height: 480,
            detection_latency: Duration::from_millis(80), // slower than the frame interval on purpose
            session_timeout: Duration::from_secs(60),
            front_hold_frames: 5,
            turn_step_degrees: 10.0,
            miss_rate: 0.05,
            crowd_rate: 0.02,
            seed: None,
            print_metrics: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fps: env_or("WORKER_FPS", defaults.fps).max(1),
            frame_width: env_or("WORKER_FRAME_WIDTH", defaults.frame_width),
            frame_height: env_or("WORKER_FRAME_HEIGHT", defaults.frame_height),
            detection_latency: Duration::from_millis(env_or(
                "WORKER_DETECTION_LATENCY_MS",
                defaults.detection_latency.as_millis() as u64,
            )),
            session_timeout: Duration::from_secs(env_or(
                "WORKER_SESSION_TIMEOUT_SECS",
                defaults.session_timeout.as_secs(),
            )),
            front_hold_frames: env_or("WORKER_FRONT_HOLD_FRAMES", defaults.front_hold_frames),
            turn_step_degrees: env_finite_or(
                "WORKER_TURN_STEP_DEGREES",
                defaults.turn_step_degrees,
            ),
            miss_rate: env_finite_or("WORKER_MISS_RATE", defaults.miss_rate).clamp(0.0, 1.0),
            crowd_rate: env_finite_or("WORKER_CROWD_RATE", defaults.crowd_rate).clamp(0.0, 1.0),
            seed: std::env::var("WORKER_SEED").ok().and_then(|s| s.parse().ok()),
            print_metrics: std::env::var("WORKER_PRINT_METRICS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.frame_width, self.frame_height)
    }

    /// Time between two camera frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Like [`env_or`], but NaN and infinities fall back to the default.
fn env_finite_or(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.frame_size(), FrameSize::new(640, 480));
        assert!(config.detection_latency > config.frame_interval());
    }

    #[test]
    fn test_frame_interval() {
        let config = WorkerConfig {
            fps: 50,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));

        let config = WorkerConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_non_finite_env_values_keep_defaults() {
        std::env::set_var("WORKER_MISS_RATE", "NaN");
        std::env::set_var("WORKER_CROWD_RATE", "inf");
        std::env::set_var("WORKER_TURN_STEP_DEGREES", "-inf");
        let config = WorkerConfig::from_env();
        std::env::remove_var("WORKER_MISS_RATE");
        std::env::remove_var("WORKER_CROWD_RATE");
        std::env::remove_var("WORKER_TURN_STEP_DEGREES");

        let defaults = WorkerConfig::default();
        assert_eq!(config.miss_rate, defaults.miss_rate);
        assert_eq!(config.crowd_rate, defaults.crowd_rate);
        assert_eq!(config.turn_step_degrees, defaults.turn_step_degrees);
    }

    #[test]
    fn test_env_finite_or_parses_finite_values() {
        std::env::set_var("WORKER_TEST_RATE", "0.25");
        assert_eq!(env_finite_or("WORKER_TEST_RATE", 0.5), 0.25);
        std::env::set_var("WORKER_TEST_RATE", "nan");
        assert_eq!(env_finite_or("WORKER_TEST_RATE", 0.5), 0.5);
        std::env::remove_var("WORKER_TEST_RATE");
        assert_eq!(env_finite_or("WORKER_TEST_RATE", 0.5), 0.5);
    }
}
