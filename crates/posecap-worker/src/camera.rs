//! Synthetic camera source.

use std::time::Duration;

use image::{DynamicImage, RgbImage};
use posecap_core::{Admission, Frame, FrameSize, ImageHandle, SessionHandle};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::WorkerConfig;

/// What the camera delivered during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CameraStats {
    pub frames_sent: u64,
    pub frames_accepted: u64,
    pub frames_dropped: u64,
}

/// Camera that produces gradient frames at a fixed rate.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    size: FrameSize,
    interval: Duration,
}

impl SyntheticCamera {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            size: config.frame_size(),
            interval: config.frame_interval(),
        }
    }

    /// Render frame `id`. The tint shifts per frame so captures are
    /// distinguishable.
    pub fn frame(&self, id: u64) -> Frame {
        let shade = (id % 256) as u8;
        let (width, height) = (self.size.width.max(1), self.size.height.max(1));
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                shade,
            ])
        });
        Frame::new(id, ImageHandle::new(DynamicImage::ImageRgb8(image)))
    }

    /// Deliver frames until the session stops capturing.
    ///
    /// Frames are offered at the configured rate whether or not detection
    /// keeps up; the session drops what it cannot take.
    pub async fn run(&self, session: &SessionHandle) -> CameraStats {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut capturing = session.capturing();
        let mut stats = CameraStats::default();
        let mut next_id = 0;

        info!(
            width = self.size.width,
            height = self.size.height,
            interval_ms = self.interval.as_millis() as u64,
            "Camera started"
        );

        while *capturing.borrow() {
            tokio::select! {
                changed = capturing.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let frame = self.frame(next_id);
                    next_id += 1;
                    match session.submit_frame(frame) {
                        Ok(Admission::Accepted) => stats.frames_accepted += 1,
                        Ok(Admission::Dropped(_)) => stats.frames_dropped += 1,
                        Err(e) => {
                            debug!(error = %e, "Session refused frame");
                            break;
                        }
                    }
                    stats.frames_sent += 1;
                }
            }
        }

        info!(
            sent = stats.frames_sent,
            accepted = stats.frames_accepted,
            dropped = stats.frames_dropped,
            "Camera stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecap_core::{CaptureConfig, CaptureSession, ScriptedDetector};
    use std::sync::Arc;

    #[test]
    fn test_frame_rendering() {
        let camera = SyntheticCamera::new(&WorkerConfig {
            frame_width: 32,
            frame_height: 24,
            ..Default::default()
        });
        let frame = camera.frame(3);
        assert_eq!(frame.id, 3);
        assert_eq!(frame.size(), FrameSize::new(32, 24));
        let pixel = frame.image.image().to_rgb8().get_pixel(0, 0).0;
        assert_eq!(pixel, [0, 0, 3]);
    }

    #[tokio::test]
    async fn test_camera_stops_with_session() {
        let camera = SyntheticCamera::new(&WorkerConfig {
            fps: 200,
            frame_width: 64,
            frame_height: 48,
            ..Default::default()
        });
        let session =
            CaptureSession::start(CaptureConfig::default(), Arc::new(ScriptedDetector::default()))
                .unwrap();

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.stop().unwrap();
        };
        let (stats, ()) = tokio::time::timeout(Duration::from_secs(2), async {
            tokio::join!(camera.run(&session), stopper)
        })
        .await
        .unwrap();

        assert!(stats.frames_sent > 0);
        assert_eq!(
            stats.frames_sent,
            stats.frames_accepted + stats.frames_dropped
        );
        assert!(!session.is_capturing());
    }
}
