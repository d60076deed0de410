//! # glint-visual
//!
//! Pixel-level visual regression comparison for the Glint QA engine.
//!
//! This crate provides:
//! - RGBA pixel diffing with antialiasing detection and ignore regions
//! - Baseline storage with content hashing and versioning
//! - Element-scoped comparison over sub-rectangles
//! - Transport-safe baseline export/import
//!
//! The engine is independent of the orchestrator in `glint-core`; a test
//! body may call into it as ordinary test logic.

mod baseline;
mod compare;
mod config;
mod engine;

pub use baseline::{content_hash, Baseline, BaselineExport, BaselineMeta, BaselineSummary};
pub use compare::{luminance, pixel_delta, ANTIALIAS_NEIGHBOR_DELTA};
pub use config::DiffConfig;
pub use engine::{
    BaselineRef, BatchComparison, Comparison, ComparisonRecord, DiffEngine, DiffStats,
    ElementComparison, ElementError, ElementTarget, MismatchReason, VisualError,
};
