//! Capture metrics recorded through the `metrics` facade.
//!
//! Nothing is exported unless the embedding binary installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Frame admission
    pub const FRAMES_OFFERED_TOTAL: &str = "posecap_frames_offered_total";
    pub const FRAMES_DROPPED_TOTAL: &str = "posecap_frames_dropped_total";

    // Detection
    pub const FRAMES_PROCESSED_TOTAL: &str = "posecap_frames_processed_total";
    pub const DETECTION_DURATION_SECONDS: &str = "posecap_detection_duration_seconds";

    // Capture
    pub const CAPTURES_TOTAL: &str = "posecap_captures_total";
    pub const SLOTS_FILLED: &str = "posecap_slots_filled";
    pub const SESSIONS_COMPLETED_TOTAL: &str = "posecap_sessions_completed_total";
    pub const SESSIONS_RESTARTED_TOTAL: &str = "posecap_sessions_restarted_total";
}

/// Record a frame handed to the gate.
pub fn record_frame_offered(accepted: bool) {
    counter!(names::FRAMES_OFFERED_TOTAL).increment(1);
    if !accepted {
        counter!(names::FRAMES_DROPPED_TOTAL).increment(1);
    }
}

/// Record the outcome of one detection pass.
pub fn record_frame_processed(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::FRAMES_PROCESSED_TOTAL, &labels).increment(1);
    histogram!(names::DETECTION_DURATION_SECONDS).record(duration_secs);
}

/// Record a filled slot.
pub fn record_capture(direction: &str) {
    let labels = [("direction", direction.to_string())];
    counter!(names::CAPTURES_TOTAL, &labels).increment(1);
}

/// Record how many slots the current session has filled.
pub fn set_slots_filled(count: usize) {
    gauge!(names::SLOTS_FILLED).set(count as f64);
}

pub fn record_session_completed() {
    counter!(names::SESSIONS_COMPLETED_TOTAL).increment(1);
}

pub fn record_session_restarted() {
    counter!(names::SESSIONS_RESTARTED_TOTAL).increment(1);
}
