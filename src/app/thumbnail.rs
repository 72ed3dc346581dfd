// SPDX-License-Identifier: GPL-3.0-only

//! Gallery thumbnail built from the last preview frame

use crate::backends::types::CameraFrame;
use image::RgbaImage;
use image::imageops;

/// Downscaled RGBA copy of a preview frame
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub image: RgbaImage,
    /// Sequence of the preview frame it was made from
    pub source_sequence: u64,
}

impl Thumbnail {
    /// Scale `frame` so its longer side is at most `max_dimension`.
    ///
    /// Returns `None` when the frame buffer is shorter than its header claims.
    pub fn from_frame(frame: &CameraFrame, max_dimension: u32) -> Option<Self> {
        let packed = frame.packed_rgba();
        let image = RgbaImage::from_raw(frame.width, frame.height, packed)?;

        let (width, height) = fit_within(frame.width, frame.height, max_dimension.max(1));
        let image = if (width, height) == (frame.width, frame.height) {
            image
        } else {
            imageops::thumbnail(&image, width, height)
        };

        Some(Self {
            image,
            source_sequence: frame.sequence,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Largest size with the same aspect ratio whose sides fit in `max_dimension`
fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(longest);
        scaled.max(1) as u32
    };
    (scale(width), scale(height))
}
