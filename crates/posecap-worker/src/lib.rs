//! Capture session worker.
//!
//! This crate provides:
//! - Synthetic camera that pushes frames at a fixed rate
//! - Synthetic detector simulating a user turning their head
//! - Session runner producing a serializable capture report

pub mod camera;
pub mod config;
pub mod detector;
pub mod runner;

pub use camera::{CameraStats, SyntheticCamera};
pub use config::WorkerConfig;
pub use detector::OrbitDetector;
pub use runner::{run_capture, CaptureReport};
