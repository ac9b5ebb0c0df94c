//! Face pose capture core.
//!
//! Guides a user through a fixed set of head orientations and keeps one
//! image per orientation:
//!
//! ```text
//! Frame ─▶ FrameGate ─▶ FaceLandmarkDetector ─▶ FaceObservation
//!                                                    │
//!                         DirectionPolicy ◀── CaptureRegistry ─▶ Gallery
//! ```
//!
//! - `geometry`: circumscribed circle of three landmarks, distances, angles
//! - `observation`: one detected face with its derived center
//! - `policy`: front and peripheral eligibility rules
//! - `registry`: write-once slots per direction
//! - `gate`: drop-on-busy single-slot frame mailbox
//! - `session`: detection task wiring the above together
//! - `testing`: scripted detector and synthetic faces (`test-utils` feature)

pub mod config;
pub mod detector;
pub mod error;
pub mod frame;
pub mod gate;
pub mod geometry;
pub mod metrics;
pub mod observation;
pub mod policy;
pub mod registry;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{AngleReference, CaptureConfig, DetectorOrigin, DetectorScale};
pub use detector::FaceLandmarkDetector;
pub use error::{CaptureError, CaptureResult};
pub use frame::{Frame, ImageHandle};
pub use gate::{Admission, FrameGate, GateStats, InFlight};
pub use geometry::Circle;
pub use observation::{FaceLandmarks, FaceObservation};
pub use policy::{DirectionPolicy, RejectReason, Verdict};
pub use registry::{
    CaptureRegistry, FrameOutcome, Gallery, GalleryEntry, GalleryEntrySummary, GallerySummary,
};
pub use session::{CaptureSession, SessionEvent, SessionHandle, SessionStats};
#[cfg(any(test, feature = "test-utils"))]
pub use testing::{face_with_center, ScriptStep, ScriptedDetector};

pub use posecap_models::{
    DetectedFace, Direction, DirectionLayout, FaceRect, FrameSize, LayoutError, Point2D,
};
