//! The diff engine: pixel comparison, baseline storage, element-scoped
//! comparison, and comparison history.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use glint_proto::{ImageBuffer, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::baseline::{content_hash, Baseline, BaselineExport, BaselineSummary};
use crate::compare::{
    antialias_color, ignored_color, is_antialiased, match_color, mismatch_color, pixel_delta,
};
use crate::config::DiffConfig;

/// Errors from baseline import and element extraction. Comparison outcomes
/// (dimension mismatch, missing baseline) are reported on [`Comparison`],
/// not as errors.
#[derive(Debug, Error)]
pub enum VisualError {
    /// An imported payload carried pixel data that is not valid base64.
    #[error("baseline '{name}' carries invalid base64 pixel data: {source}")]
    Decode {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    /// An imported payload's byte length disagrees with its dimensions.
    #[error(transparent)]
    Image(#[from] glint_proto::ImageBufferError),

    /// An element's region lies entirely outside the captured images.
    #[error("element '{selector}' region is outside the captured images")]
    EmptyRegion { selector: String },
}

/// Why a comparison could not match, when the failure is structural rather
/// than pixel-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// The two images have different dimensions; pixels were not compared.
    DimensionMismatch,
    /// No baseline is stored under the requested name.
    BaselineNotFound,
}

/// The baseline a comparison was made against.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineRef {
    pub name: String,
    pub hash: String,
    pub version: u32,
}

/// Outcome of one comparison.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    /// Overall verdict: `diff_percent <= threshold * 100`.
    #[serde(rename = "match")]
    pub matched: bool,
    /// Set when the verdict was decided without comparing pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<MismatchReason>,
    /// Pixels counted as mismatches.
    pub diff_pixels: usize,
    /// Divergent pixels classified as antialiasing noise.
    pub antialiased_pixels: usize,
    /// Pixels excluded by ignore regions.
    pub ignored_pixels: usize,
    /// `width * height` of the compared images.
    pub total_pixels: usize,
    /// `100 * diff_pixels / total_pixels`.
    pub diff_percent: f64,
    /// Largest per-pixel delta observed among mismatches, in [0, 1].
    pub max_delta: f64,
    pub width: u32,
    pub height: u32,
    /// Visualization: dimmed baseline for matches, markers for ignored and
    /// antialiased pixels, intensity-scaled red for mismatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<ImageBuffer>,
    /// Present when the comparison was made against a stored baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineRef>,
    /// Actionable hint, set alongside `baseline_not_found`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Comparison {
    fn structural(reason: MismatchReason, width: u32, height: u32) -> Self {
        Self {
            matched: false,
            reason: Some(reason),
            diff_pixels: 0,
            antialiased_pixels: 0,
            ignored_pixels: 0,
            total_pixels: 0,
            diff_percent: 100.0,
            max_delta: 0.0,
            width,
            height,
            diff_image: None,
            baseline: None,
            suggestion: None,
        }
    }
}

/// A comparison target scoped to one page element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementTarget {
    /// Selector or logical name of the element.
    pub selector: String,
    /// The element's bounding box in image coordinates.
    pub region: Region,
}

impl ElementTarget {
    pub fn new(selector: impl Into<String>, region: Region) -> Self {
        Self {
            selector: selector.into(),
            region,
        }
    }
}

/// Per-element comparison outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ElementComparison {
    pub selector: String,
    pub region: Region,
    pub comparison: Comparison,
}

/// Aggregate outcome of a multi-element comparison. Elements whose regions
/// could not be extracted land in `errors` without aborting the batch.
#[derive(Debug, Serialize)]
pub struct BatchComparison {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<ElementComparison>,
    pub errors: Vec<ElementError>,
}

/// One element the batch could not compare.
#[derive(Debug, Clone, Serialize)]
pub struct ElementError {
    pub selector: String,
    pub message: String,
}

/// One entry in the comparison history.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRecord {
    pub timestamp: DateTime<Utc>,
    pub matched: bool,
    pub diff_percent: f64,
}

/// Aggregates over the comparison history and the baseline store.
#[derive(Debug, Clone, Serialize)]
pub struct DiffStats {
    pub comparisons: usize,
    pub matched: usize,
    /// Matched share of all comparisons, in [0, 1]. Zero when empty.
    pub match_rate: f64,
    /// Mean `diff_percent` across all comparisons. Zero when empty.
    pub avg_diff_percent: f64,
    pub baseline_count: usize,
}

/// Visual diff engine. Owns its baseline store and comparison history;
/// independent instances do not share state.
#[derive(Default)]
pub struct DiffEngine {
    baselines: HashMap<String, Baseline>,
    history: Vec<ComparisonRecord>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares two images pixel by pixel.
    ///
    /// Images of different dimensions short-circuit to a structural
    /// mismatch without touching pixel data. Every call, including
    /// short-circuits, is recorded in the history.
    pub fn compare(
        &mut self,
        baseline: &ImageBuffer,
        current: &ImageBuffer,
        config: &DiffConfig,
    ) -> Comparison {
        let comparison = self.compare_images(baseline, current, config);
        self.record(&comparison);
        comparison
    }

    /// Compares `current` against the stored baseline `name`.
    ///
    /// A missing baseline yields a non-matching outcome with the
    /// `baseline_not_found` reason and a suggestion; it is not an error.
    pub fn compare_to_baseline(
        &mut self,
        name: &str,
        current: &ImageBuffer,
        config: &DiffConfig,
    ) -> Comparison {
        let Some(baseline) = self.baselines.get(name) else {
            warn!(baseline = name, "comparison against unknown baseline");
            let mut comparison =
                Comparison::structural(MismatchReason::BaselineNotFound, current.width, current.height);
            comparison.suggestion = Some(format!(
                "store a baseline named '{name}' before comparing against it"
            ));
            self.record(&comparison);
            return comparison;
        };

        let reference = BaselineRef {
            name: baseline.name.clone(),
            hash: baseline.hash.clone(),
            version: baseline.meta.version,
        };
        let image = baseline.image.clone();

        let mut comparison = self.compare_images(&image, current, config);
        comparison.baseline = Some(reference);
        self.record(&comparison);
        comparison
    }

    /// Compares one element's region, extracted from both images.
    ///
    /// # Errors
    ///
    /// Returns [`VisualError::EmptyRegion`] when the region lies entirely
    /// outside either image.
    pub fn compare_element(
        &mut self,
        baseline: &ImageBuffer,
        current: &ImageBuffer,
        target: &ElementTarget,
        config: &DiffConfig,
    ) -> Result<ElementComparison, VisualError> {
        let baseline_crop = baseline.extract(&target.region);
        let current_crop = current.extract(&target.region);
        if baseline_crop.pixel_count() == 0 || current_crop.pixel_count() == 0 {
            return Err(VisualError::EmptyRegion {
                selector: target.selector.clone(),
            });
        }

        let comparison = self.compare(&baseline_crop, &current_crop, config);
        Ok(ElementComparison {
            selector: target.selector.clone(),
            region: target.region,
            comparison,
        })
    }

    /// Compares a batch of elements, capturing per-element failures
    /// instead of aborting.
    pub fn compare_elements(
        &mut self,
        baseline: &ImageBuffer,
        current: &ImageBuffer,
        targets: &[ElementTarget],
        config: &DiffConfig,
    ) -> BatchComparison {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for target in targets {
            match self.compare_element(baseline, current, target, config) {
                Ok(result) => results.push(result),
                Err(error) => errors.push(ElementError {
                    selector: target.selector.clone(),
                    message: error.to_string(),
                }),
            }
        }

        let passed = results.iter().filter(|r| r.comparison.matched).count();
        BatchComparison {
            total: targets.len(),
            passed,
            failed: results.len() - passed,
            results,
            errors,
        }
    }

    /// Stores `image` as the baseline `name`, returning its content hash.
    ///
    /// Storing over an existing name replaces the image and bumps the
    /// version; the first version is 1.
    pub fn store_baseline(
        &mut self,
        name: &str,
        image: ImageBuffer,
        extra: Option<Value>,
    ) -> String {
        let mut baseline = Baseline::new(name, image, extra);
        if let Some(previous) = self.baselines.get(name) {
            baseline.meta.version = previous.meta.version + 1;
        }
        debug!(
            baseline = name,
            version = baseline.meta.version,
            hash = %baseline.hash,
            "baseline stored"
        );
        let hash = baseline.hash.clone();
        self.baselines.insert(name.to_string(), baseline);
        hash
    }

    /// Summaries of all stored baselines, sorted by name.
    pub fn list_baselines(&self) -> Vec<BaselineSummary> {
        let mut summaries: Vec<BaselineSummary> =
            self.baselines.values().map(BaselineSummary::from).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Exports every stored baseline in transport-safe form, keyed by name.
    pub fn export_baselines(&self) -> HashMap<String, BaselineExport> {
        self.baselines
            .iter()
            .map(|(name, baseline)| (name.clone(), baseline.export()))
            .collect()
    }

    /// Imports baselines from an export payload, replacing any stored
    /// under the same names. Returns the number imported.
    ///
    /// # Errors
    ///
    /// Fails on invalid base64 or a byte length that disagrees with the
    /// payload's dimensions; baselines imported before the failing entry
    /// are kept.
    pub fn import_baselines(
        &mut self,
        exports: HashMap<String, BaselineExport>,
    ) -> Result<usize, VisualError> {
        let mut imported = 0;
        for (name, export) in exports {
            let data = BASE64
                .decode(&export.data)
                .map_err(|source| VisualError::Decode {
                    name: name.clone(),
                    source,
                })?;
            let image = ImageBuffer::from_raw(export.width, export.height, data)?;

            let hash = content_hash(&image);
            if hash != export.hash {
                warn!(
                    baseline = %name,
                    expected = %export.hash,
                    actual = %hash,
                    "imported baseline hash mismatch; using recomputed hash"
                );
            }

            self.baselines.insert(
                name.clone(),
                Baseline {
                    name,
                    image,
                    hash,
                    meta: export.meta,
                },
            );
            imported += 1;
        }
        debug!(count = imported, "baselines imported");
        Ok(imported)
    }

    /// Aggregates over the history and the baseline store.
    pub fn stats(&self) -> DiffStats {
        let comparisons = self.history.len();
        let matched = self.history.iter().filter(|r| r.matched).count();
        let (match_rate, avg_diff_percent) = if comparisons == 0 {
            (0.0, 0.0)
        } else {
            let rate = matched as f64 / comparisons as f64;
            let avg = self.history.iter().map(|r| r.diff_percent).sum::<f64>()
                / comparisons as f64;
            (rate, avg)
        };
        DiffStats {
            comparisons,
            matched,
            match_rate,
            avg_diff_percent,
            baseline_count: self.baselines.len(),
        }
    }

    /// Clears the comparison history. Baselines are unaffected.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, comparison: &Comparison) {
        self.history.push(ComparisonRecord {
            timestamp: Utc::now(),
            matched: comparison.matched,
            diff_percent: comparison.diff_percent,
        });
    }

    fn compare_images(
        &self,
        baseline: &ImageBuffer,
        current: &ImageBuffer,
        config: &DiffConfig,
    ) -> Comparison {
        if baseline.width != current.width || baseline.height != current.height {
            warn!(
                baseline_dims = %format!("{}x{}", baseline.width, baseline.height),
                current_dims = %format!("{}x{}", current.width, current.height),
                "dimension mismatch, pixels not compared"
            );
            return Comparison::structural(
                MismatchReason::DimensionMismatch,
                baseline.width,
                baseline.height,
            );
        }

        let (width, height) = (baseline.width, baseline.height);
        let total_pixels = baseline.pixel_count();
        let mut diff_image = ImageBuffer::new(width, height);

        let mut diff_pixels = 0usize;
        let mut antialiased_pixels = 0usize;
        let mut ignored_pixels = 0usize;
        let mut max_delta = 0.0f64;

        for y in 0..height {
            for x in 0..width {
                if config.ignore_regions.iter().any(|r| r.contains(x, y)) {
                    ignored_pixels += 1;
                    diff_image.set_pixel(x, y, ignored_color());
                    continue;
                }

                let a = baseline.pixel(x, y);
                let b = current.pixel(x, y);
                let delta = pixel_delta(a, b, config.ignore_colors);

                if delta == 0.0 {
                    diff_image.set_pixel(x, y, match_color(a));
                } else if config.antialiasing && is_antialiased(baseline, current, x, y) {
                    antialiased_pixels += 1;
                    diff_image.set_pixel(x, y, antialias_color());
                } else {
                    diff_pixels += 1;
                    max_delta = max_delta.max(delta);
                    diff_image.set_pixel(x, y, mismatch_color(delta));
                }
            }
        }

        let diff_percent = if total_pixels == 0 {
            0.0
        } else {
            100.0 * diff_pixels as f64 / total_pixels as f64
        };
        let matched = diff_percent <= config.threshold * 100.0;

        debug!(
            diff_pixels,
            antialiased_pixels,
            ignored_pixels,
            diff_percent,
            matched,
            "pixel comparison finished"
        );

        Comparison {
            matched,
            reason: None,
            diff_pixels,
            antialiased_pixels,
            ignored_pixels,
            total_pixels,
            diff_percent,
            max_delta,
            width,
            height,
            diff_image: Some(diff_image),
            baseline: None,
            suggestion: None,
        }
    }
}
