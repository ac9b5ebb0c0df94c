//! Camera frames as they enter the capture core.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use posecap_models::FrameSize;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable handle to a frame image.
///
/// Cloning is cheap; every clone refers to the same pixels.
#[derive(Clone)]
pub struct ImageHandle(Arc<DynamicImage>);

impl ImageHandle {
    /// Wrap a decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    /// Black single-channel image of the given size.
    pub fn blank(size: FrameSize) -> Self {
        Self::new(DynamicImage::new_luma8(size.width, size.height))
    }

    /// Pixel dimensions of the image.
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.0.width(), self.0.height())
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.0
    }

    /// Check whether both handles refer to the same image.
    pub fn same_image(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        write!(f, "ImageHandle({}x{})", size.width, size.height)
    }
}

/// One camera frame, already converted to a displayable image.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic frame number assigned by the camera source
    pub id: u64,
    pub image: ImageHandle,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame stamped with the current time.
    pub fn new(id: u64, image: ImageHandle) -> Self {
        Self {
            id,
            image,
            captured_at: Utc::now(),
        }
    }

    /// Pixel dimensions of the frame.
    pub fn size(&self) -> FrameSize {
        self.image.size()
    }
}
