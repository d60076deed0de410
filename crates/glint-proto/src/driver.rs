//! Automation driver abstractions.
//!
//! Defines the [`Driver`] trait that browser/device automation layers
//! implement. The orchestration core never drives a page itself — it only
//! needs a handle it can ask to run an arbitrary asynchronous operation or
//! to capture the current surface as an image.

use async_trait::async_trait;
use serde_json::Value;

use crate::ImageBuffer;

/// Capability contract for an external automation driver.
///
/// Implementors handle all backend-specific concerns: session management,
/// navigation, element interaction. The core calls `capture` when a failing
/// test is configured to keep a diagnostic artifact; everything else a test
/// body wants from the driver goes through `perform`.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Runs a named asynchronous operation with an opaque payload.
    async fn perform(&self, action: &str, payload: Value) -> anyhow::Result<Value>;

    /// Captures the current surface as a raw RGBA image.
    async fn capture(&self) -> anyhow::Result<ImageBuffer>;
}
