// SPDX-License-Identifier: GPL-3.0-only

//! Preview luma histogram
//!
//! Computed on the CPU from a sampled subset of pixels so it can run for
//! every few frames without competing with the preview.

use crate::backends::types::CameraFrame;
use crate::constants::analysis::HISTOGRAM_BINS;

/// Luma histogram of one preview frame
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: Vec<u32>,
    samples: u32,
    /// Sequence of the frame it was computed from
    pub frame_sequence: u64,
}

impl Histogram {
    /// Sample every `stride`-th pixel on both axes (stride 0 is treated as 1)
    pub fn compute(frame: &CameraFrame, stride: u32) -> Self {
        let stride = stride.max(1) as usize;
        let mut bins = vec![0u32; HISTOGRAM_BINS];
        let mut samples = 0u32;

        let bpp = frame.format.bytes_per_pixel();
        let (r_off, g_off, b_off) = frame.format.rgb_offsets();
        let data = frame.data();
        let row_stride = frame.stride as usize;

        for y in (0..frame.height as usize).step_by(stride) {
            let row_start = y * row_stride;
            for x in (0..frame.width as usize).step_by(stride) {
                let offset = row_start + x * bpp;
                if offset + bpp > data.len() {
                    break;
                }
                let r = u32::from(data[offset + r_off]);
                let g = u32::from(data[offset + g_off]);
                let b = u32::from(data[offset + b_off]);
                // BT.601 integer weights
                let luma = (77 * r + 150 * g + 29 * b) >> 8;
                bins[luma.min(255) as usize] += 1;
                samples += 1;
            }
        }

        Self {
            bins,
            samples,
            frame_sequence: frame.sequence,
        }
    }

    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Mean luma in [0, 255]
    pub fn mean(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        let total: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(value, count)| value as u64 * u64::from(*count))
            .sum();
        total as f32 / self.samples as f32
    }

    /// Smallest luma value at or below which `fraction` of samples fall
    pub fn percentile(&self, fraction: f32) -> u8 {
        if self.samples == 0 {
            return 0;
        }
        let target = (fraction.clamp(0.0, 1.0) * self.samples as f32).ceil() as u32;
        let mut seen = 0u32;
        for (value, count) in self.bins.iter().enumerate() {
            seen += count;
            if seen >= target.max(1) {
                return value as u8;
            }
        }
        255
    }

    /// Fraction of samples in the top bin (blown highlights)
    pub fn clipped_fraction(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        self.bins[HISTOGRAM_BINS - 1] as f32 / self.samples as f32
    }
}
