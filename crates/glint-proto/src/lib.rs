//! # glint-proto
//!
//! Shared data contracts for the Glint QA engine.
//!
//! This crate defines the types that cross component boundaries: the RGBA
//! [`ImageBuffer`] exchanged between the orchestrator, the diff engine, and
//! the external automation driver, plus the [`Driver`] capability trait the
//! orchestrator uses to capture diagnostic artifacts.

mod driver;
mod image;

pub use driver::Driver;
pub use image::{ImageBuffer, ImageBufferError, Region, BYTES_PER_PIXEL};
