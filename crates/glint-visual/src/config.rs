//! Comparison configuration.

use glint_proto::Region;

/// Options for one comparison. Every recognized option is enumerated with
/// an explicit default.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Maximum tolerated share of mismatching pixels, in [0, 1].
    /// `match` holds iff `diff_percent <= threshold * 100`.
    pub threshold: f64,

    /// Classify edge noise via the 8-neighborhood heuristic and exclude it
    /// from the mismatch count.
    pub antialiasing: bool,

    /// Compare luminance only, ignoring color.
    pub ignore_colors: bool,

    /// Rectangles excluded from the comparison (dynamic timestamps, ads).
    pub ignore_regions: Vec<Region>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            antialiasing: true,
            ignore_colors: false,
            ignore_regions: Vec::new(),
        }
    }
}

impl DiffConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mismatch threshold, clamped to [0, 1].
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Enables or disables antialiasing detection.
    pub fn with_antialiasing(mut self, enabled: bool) -> Self {
        self.antialiasing = enabled;
        self
    }

    /// Enables luminance-only comparison.
    pub fn ignore_colors(mut self, ignore: bool) -> Self {
        self.ignore_colors = ignore;
        self
    }

    /// Adds a rectangle to exclude from the comparison.
    pub fn with_ignore_region(mut self, region: Region) -> Self {
        self.ignore_regions.push(region);
        self
    }
}
