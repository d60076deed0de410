//! Raw RGBA image buffers.
//!
//! The buffer layout is the contract shared by the orchestrator, the diff
//! engine, and the external capture driver: row-major RGBA8, one byte per
//! channel, `data.len() == width * height * 4`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes per pixel (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors from constructing an image buffer.
#[derive(Debug, Error)]
pub enum ImageBufferError {
    /// The raw byte length does not match the stated dimensions.
    #[error("buffer length {actual} does not match {width}x{height} RGBA ({expected} bytes)")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A raw RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl ImageBuffer {
    /// Creates a zeroed (transparent black) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Creates a buffer filled with a single color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wraps raw bytes, validating the length against the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageBufferError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ImageBufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte offset of the pixel at `(x, y)`.
    ///
    /// Callers must ensure the coordinate is in bounds.
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Reads the RGBA channels of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.pixel_offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Writes the RGBA channels of the pixel at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.pixel_offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Copies the sub-rectangle `region` into a new buffer, row by row.
    ///
    /// The region is clamped to the image bounds; a region fully outside
    /// the image yields an empty 0x0 buffer.
    pub fn extract(&self, region: &Region) -> ImageBuffer {
        let x0 = region.x.min(self.width);
        let y0 = region.y.min(self.height);
        let x1 = region.x.saturating_add(region.width).min(self.width);
        let y1 = region.y.saturating_add(region.height).min(self.height);
        let out_w = x1 - x0;
        let out_h = y1 - y0;

        let mut data = Vec::with_capacity(out_w as usize * out_h as usize * BYTES_PER_PIXEL);
        for y in y0..y1 {
            let start = self.pixel_offset(x0, y);
            let end = start + out_w as usize * BYTES_PER_PIXEL;
            data.extend_from_slice(&self.data[start..end]);
        }

        ImageBuffer {
            width: out_w,
            height: out_h,
            data,
        }
    }
}

/// An axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Creates a new region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the point `(x, y)` falls inside this region.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x.saturating_add(self.width)
            && y < self.y.saturating_add(self.height)
    }
}
