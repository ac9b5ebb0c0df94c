//! Runs one capture session end to end.

use std::sync::Arc;

use anyhow::Context;
use posecap_core::{
    CaptureConfig, CaptureSession, Gallery, GallerySummary, SessionEvent, SessionStats,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::camera::{CameraStats, SyntheticCamera};
use crate::config::WorkerConfig;
use crate::detector::OrbitDetector;

/// Result of a capture run.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub session_id: Uuid,
    pub completed: bool,
    pub gallery: Option<GallerySummary>,
    pub session: SessionStats,
    pub camera: CameraStats,
}

/// Drive a session with the synthetic camera and detector until every
/// direction is captured, the timeout expires or the process is
/// interrupted.
pub async fn run_capture(
    config: &WorkerConfig,
    capture: CaptureConfig,
) -> anyhow::Result<CaptureReport> {
    let detector = Arc::new(OrbitDetector::new(config));
    let camera = SyntheticCamera::new(config);

    let mut session =
        CaptureSession::start(capture, detector).context("Failed to start capture session")?;
    let mut events = session
        .events()
        .context("Session event stream already taken")?;
    let session_id = session.session_id();

    let listener = tokio::spawn(async move {
        let mut gallery: Option<Gallery> = None;
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::FrameProcessed { frame_id, outcome } => {
                    if let Some(direction) = outcome.captured() {
                        info!(frame_id, direction = %direction, "Guide: direction captured");
                    } else {
                        debug!(frame_id, outcome = outcome.as_str(), "Guide: keep turning");
                    }
                }
                SessionEvent::Completed(done) => gallery = Some(done),
                SessionEvent::Restarted { session_id } => {
                    info!(session_id = %session_id, "Guide: starting over");
                    gallery = None;
                }
                SessionEvent::Stopped => break,
            }
        }
        gallery
    });

    let camera_stats = tokio::select! {
        result = tokio::time::timeout(config.session_timeout, camera.run(&session)) => {
            match result {
                Ok(stats) => stats,
                Err(_) => {
                    warn!(
                        timeout_secs = config.session_timeout.as_secs(),
                        "Capture session timed out"
                    );
                    CameraStats::default()
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            CameraStats::default()
        }
    };

    let stats = session.stats();
    session
        .shutdown()
        .await
        .context("Failed to shut down capture session")?;
    let gallery = listener.await.context("Event listener panicked")?;

    Ok(CaptureReport {
        session_id,
        completed: gallery.is_some(),
        gallery: gallery.map(|g| g.summary()),
        session: stats,
        camera: camera_stats,
    })
}
