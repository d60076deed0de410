//! Baseline records: named reference images with content hashes,
//! versioning, and a transport-safe export form.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use glint_proto::ImageBuffer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Length of the hex content hash carried on a baseline.
const HASH_LEN: usize = 16;

/// Content hash of an image: SHA-256 over the raw bytes and the
/// dimensions, truncated to 16 hex characters. Two images with identical
/// bytes but different declared dimensions hash differently.
pub fn content_hash(image: &ImageBuffer) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&image.data);
    hasher.update(format!("{}x{}", image.width, image.height).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Bookkeeping attached to a stored baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineMeta {
    /// When this version was stored.
    pub created_at: DateTime<Utc>,
    /// Starts at 1, bumped each time the name is overwritten.
    pub version: u32,
    /// Caller-supplied annotations (browser, viewport, build id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// A named reference image.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub name: String,
    pub image: ImageBuffer,
    pub hash: String,
    pub meta: BaselineMeta,
}

impl Baseline {
    /// Creates a first-version baseline from a capture.
    pub fn new(name: impl Into<String>, image: ImageBuffer, extra: Option<Value>) -> Self {
        let hash = content_hash(&image);
        Self {
            name: name.into(),
            image,
            hash,
            meta: BaselineMeta {
                created_at: Utc::now(),
                version: 1,
                extra,
            },
        }
    }

    /// Serializable form with the pixel data encoded as base64.
    pub fn export(&self) -> BaselineExport {
        BaselineExport {
            name: self.name.clone(),
            width: self.image.width,
            height: self.image.height,
            data: BASE64.encode(&self.image.data),
            hash: self.hash.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// One-line summary of a stored baseline, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineSummary {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub hash: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Whether caller-supplied annotations are attached.
    pub has_metadata: bool,
}

impl From<&Baseline> for BaselineSummary {
    fn from(baseline: &Baseline) -> Self {
        Self {
            name: baseline.name.clone(),
            width: baseline.image.width,
            height: baseline.image.height,
            hash: baseline.hash.clone(),
            version: baseline.meta.version,
            created_at: baseline.meta.created_at,
            has_metadata: baseline.meta.extra.is_some(),
        }
    }
}

/// Transport-safe baseline payload: dimensions, base64 pixel data, hash,
/// and metadata. Round-trips through `Baseline::export` and
/// [`crate::DiffEngine::import_baselines`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineExport {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: String,
    pub hash: String,
    pub meta: BaselineMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_truncated() {
        let img = ImageBuffer::solid(2, 2, [1, 2, 3, 255]);
        let h1 = content_hash(&img);
        let h2 = content_hash(&img);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_depends_on_dimensions() {
        // Same bytes, transposed dimensions.
        let wide = ImageBuffer::from_raw(2, 1, vec![7; 8]).unwrap();
        let tall = ImageBuffer::from_raw(1, 2, vec![7; 8]).unwrap();
        assert_ne!(content_hash(&wide), content_hash(&tall));
    }

    #[test]
    fn test_new_baseline_starts_at_version_one() {
        let baseline = Baseline::new("home", ImageBuffer::new(4, 4), None);
        assert_eq!(baseline.meta.version, 1);
        assert_eq!(baseline.hash, content_hash(&baseline.image));
    }

    #[test]
    fn test_export_encodes_pixel_data() {
        let image = ImageBuffer::solid(1, 1, [255, 0, 0, 255]);
        let baseline = Baseline::new("dot", image.clone(), None);
        let export = baseline.export();
        assert_eq!(export.width, 1);
        assert_eq!(export.height, 1);
        assert_eq!(BASE64.decode(export.data).unwrap(), image.data);
    }
}
