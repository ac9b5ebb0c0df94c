//! Capture session orchestration.
//!
//! Two contexts share a session:
//!
//! ```text
//!  camera ──submit_frame──▶ FrameGate ──next()──▶ detection task
//!    ▲                     (1 slot)               │ detect + classify
//!    │                                            ▼
//!    └──────── capturing (watch) ◀──────── CaptureRegistry
//! ```
//!
//! The producer only offers frames and reads the capturing flag. The
//! detection task owns the registry, so slot mutation is serialized without
//! a lock. Restart and stop are commands handled by the same task between
//! frames; an in-flight detection always runs to completion.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use posecap_models::{DetectedFace, DirectionLayout};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{CaptureConfig, DetectorOrigin, DetectorScale};
use crate::detector::FaceLandmarkDetector;
use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;
use crate::gate::{Admission, FrameGate};
use crate::metrics;
use crate::registry::{CaptureRegistry, FrameOutcome, Gallery};

/// Notifications for the UI side of a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A frame went through detection and classification.
    FrameProcessed { frame_id: u64, outcome: FrameOutcome },
    /// Every direction was captured. Capturing is now off.
    Completed(Gallery),
    /// The registry was replaced by an empty one.
    Restarted { session_id: Uuid },
    /// The detection task exited.
    Stopped,
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames_offered: u64,
    pub frames_accepted: u64,
    pub frames_dropped: u64,
    pub frames_processed: u64,
    pub detector_failures: u64,
    pub slots_filled: usize,
    pub slots_total: usize,
}

#[derive(Debug)]
enum SessionCommand {
    Restart,
    Stop,
}

#[derive(Debug, Default)]
struct SessionCounters {
    processed: AtomicU64,
    detector_failures: AtomicU64,
    filled: AtomicUsize,
}

/// Entry point for running a capture session.
pub struct CaptureSession;

impl CaptureSession {
    /// Validate the configuration and spawn the detection task.
    ///
    /// Must be called from within a Tokio runtime. The session starts in
    /// the capturing state.
    pub fn start(
        config: CaptureConfig,
        detector: Arc<dyn FaceLandmarkDetector>,
    ) -> CaptureResult<SessionHandle> {
        let registry = CaptureRegistry::new(&config)?;
        let session_id = registry.session_id();
        let layout = registry.layout();

        let gate = Arc::new(FrameGate::new());
        let counters = Arc::new(SessionCounters::default());
        let (capturing_tx, capturing_rx) = watch::channel(true);
        let (session_tx, session_rx) = watch::channel(session_id);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        info!(
            session_id = %session_id,
            directions = layout.count(),
            detector = detector.name(),
            angle_reference = %config.angle_reference,
            "Starting capture session"
        );

        let worker = SessionWorker {
            registry,
            detector,
            origin: config.detector_origin,
            scale: config.detector_scale,
            counters: Arc::clone(&counters),
            capturing: capturing_tx,
            session_id: session_tx,
            events: event_tx,
        };
        let span = info_span!("capture_session", session_id = %session_id);
        let task = tokio::spawn(run(worker, Arc::clone(&gate), command_rx).instrument(span));

        Ok(SessionHandle {
            gate,
            commands: command_tx,
            capturing: capturing_rx,
            session_id: session_rx,
            events: Some(event_rx),
            counters,
            layout,
            task: Some(task),
        })
    }
}

/// Control surface of a running session.
///
/// Dropping the handle stops the detection task after its current frame.
pub struct SessionHandle {
    gate: Arc<FrameGate<Frame>>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    capturing: watch::Receiver<bool>,
    session_id: watch::Receiver<Uuid>,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    counters: Arc<SessionCounters>,
    layout: DirectionLayout,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Offer a camera frame for detection.
    ///
    /// Never waits on detection. A frame offered while another one is in
    /// flight is handed back as [`Admission::Dropped`].
    pub fn submit_frame(&self, frame: Frame) -> CaptureResult<Admission<Frame>> {
        if self.commands.is_closed() {
            return Err(CaptureError::SessionClosed);
        }
        if !self.is_capturing() {
            return Err(CaptureError::NotCapturing);
        }
        Ok(self.gate.offer(frame))
    }

    /// Whether the session still wants frames.
    pub fn is_capturing(&self) -> bool {
        *self.capturing.borrow()
    }

    /// Watch receiver for the capturing flag, for the frame producer.
    pub fn capturing(&self) -> watch::Receiver<bool> {
        self.capturing.clone()
    }

    /// Id of the current registry. Changes on restart.
    pub fn session_id(&self) -> Uuid {
        *self.session_id.borrow()
    }

    pub fn layout(&self) -> DirectionLayout {
        self.layout
    }

    /// Take the event stream. Returns `None` after the first call.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }

    /// Discard every capture and start over with an empty registry.
    pub fn restart(&self) -> CaptureResult<()> {
        self.commands
            .send(SessionCommand::Restart)
            .map_err(|_| CaptureError::SessionClosed)
    }

    /// Ask the detection task to exit after its current frame.
    pub fn stop(&self) -> CaptureResult<()> {
        self.commands
            .send(SessionCommand::Stop)
            .map_err(|_| CaptureError::SessionClosed)
    }

    /// Wait until the capturing flag turns off, either on completion or
    /// on stop.
    pub async fn wait_idle(&self) -> CaptureResult<()> {
        let mut capturing = self.capturing.clone();
        capturing
            .wait_for(|capturing| !*capturing)
            .await
            .map(|_| ())
            .map_err(|_| CaptureError::SessionClosed)
    }

    /// Stop the session and wait for the detection task to exit.
    pub async fn shutdown(mut self) -> CaptureResult<()> {
        let _ = self.commands.send(SessionCommand::Stop);
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| CaptureError::internal(format!("Session task failed: {}", e)))?;
        }
        Ok(())
    }

    pub fn stats(&self) -> SessionStats {
        let gate = self.gate.stats();
        SessionStats {
            frames_offered: gate.offered,
            frames_accepted: gate.accepted,
            frames_dropped: gate.dropped,
            frames_processed: self.counters.processed.load(Ordering::Relaxed),
            detector_failures: self.counters.detector_failures.load(Ordering::Relaxed),
            slots_filled: self.counters.filled.load(Ordering::Relaxed),
            slots_total: self.layout.count(),
        }
    }
}

/// State owned by the detection task.
struct SessionWorker {
    registry: CaptureRegistry,
    detector: Arc<dyn FaceLandmarkDetector>,
    origin: DetectorOrigin,
    scale: DetectorScale,
    counters: Arc<SessionCounters>,
    capturing: watch::Sender<bool>,
    session_id: watch::Sender<Uuid>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

async fn run(
    mut worker: SessionWorker,
    gate: Arc<FrameGate<Frame>>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
) {
    loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(SessionCommand::Restart) => worker.restart(),
                Some(SessionCommand::Stop) | None => break,
            },
            in_flight = gate.next() => {
                let frame_id = in_flight.id;
                if *worker.capturing.borrow() {
                    let outcome = worker.process_frame(&in_flight).await;
                    // free the slot before anyone hears about the result
                    drop(in_flight);
                    worker.publish(frame_id, outcome);
                } else {
                    debug!(frame_id, "Discarding frame offered before capture stopped");
                }
            }
        }
    }
    drop(commands);
    worker.finish();
}

impl SessionWorker {
    async fn process_frame(&mut self, frame: &Frame) -> FrameOutcome {
        let started = Instant::now();

        let outcome = match self.detector.detect(frame).await {
            Ok(faces) => {
                let faces = self.to_image_space(faces, frame);
                self.registry.capture_faces(&faces, frame)
            }
            Err(e) => {
                warn!(
                    frame_id = frame.id,
                    detector = self.detector.name(),
                    error = %e,
                    "Face detection failed, skipping frame"
                );
                self.counters.detector_failures.fetch_add(1, Ordering::Relaxed);
                FrameOutcome::DetectorFailed
            }
        };

        metrics::record_frame_processed(outcome.as_str(), started.elapsed().as_secs_f64());
        self.counters.processed.fetch_add(1, Ordering::Relaxed);
        let filled = self.registry.filled_count();
        self.counters.filled.store(filled, Ordering::Relaxed);
        metrics::set_slots_filled(filled);
        debug!(frame_id = frame.id, outcome = outcome.as_str(), "Frame processed");
        outcome
    }

    fn publish(&mut self, frame_id: u64, outcome: FrameOutcome) {
        self.emit(SessionEvent::FrameProcessed { frame_id, outcome });
        if outcome.captured().is_some() {
            if let Some(gallery) = self.registry.gallery() {
                self.complete(gallery);
            }
        }
    }

    /// Map detector records into top-left source-image pixels: scale
    /// first, then flip against the full frame height.
    fn to_image_space(&self, faces: Vec<DetectedFace>, frame: &Frame) -> Vec<DetectedFace> {
        if self.scale.is_identity() && self.origin == DetectorOrigin::TopLeft {
            return faces;
        }
        let height = f64::from(frame.size().height);
        faces
            .iter()
            .map(|face| {
                let face = face.scaled(self.scale.x, self.scale.y);
                match self.origin {
                    DetectorOrigin::TopLeft => face,
                    DetectorOrigin::BottomLeft => face.flipped_vertically(height),
                }
            })
            .collect()
    }

    fn complete(&mut self, gallery: Gallery) {
        let elapsed = chrono::Utc::now() - self.registry.started_at();
        info!(
            session_id = %self.registry.session_id(),
            images = gallery.len(),
            elapsed_ms = elapsed.num_milliseconds(),
            "Capture session complete"
        );
        let _ = self.capturing.send(false);
        metrics::record_session_completed();
        self.emit(SessionEvent::Completed(gallery));
    }

    fn restart(&mut self) {
        let previous = self.registry.session_id();
        self.registry = CaptureRegistry::with_policy(self.registry.policy().clone());
        let session_id = self.registry.session_id();

        self.counters.filled.store(0, Ordering::Relaxed);
        metrics::set_slots_filled(0);
        metrics::record_session_restarted();
        info!(previous = %previous, session_id = %session_id, "Capture session restarted");

        let _ = self.session_id.send(session_id);
        let _ = self.capturing.send(true);
        self.emit(SessionEvent::Restarted { session_id });
    }

    fn finish(&mut self) {
        let _ = self.capturing.send(false);
        info!(
            session_id = %self.registry.session_id(),
            filled = self.registry.filled_count(),
            "Capture session stopped"
        );
        self.emit(SessionEvent::Stopped);
    }

    fn emit(&self, event: SessionEvent) {
        // the UI may have dropped its receiver
        let _ = self.events.send(event);
    }
}
