// ⚙️ Report Configuration - tunable report parameters as data
//
// Defaults reproduce the stock reports exactly; a JSON file can override
// any subset of fields. Discount categories extend the stock table:
//
// {
//   "min_bikes_per_category": 2,
//   "cube_year": 2023,
//   "segments": { "high": 10, "low": 5 },
//   "discounts": {
//     "categories": { "electric": { "hourly": 0.1, "daily": 0.2 } },
//     "default": { "hourly": 0.5, "daily": 0.5 }
//   }
// }

use crate::error::{ReportError, Result as ReportResult};
use crate::pricing::DiscountTable;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// RENTAL SEGMENTS
// ============================================================================

/// Thresholds splitting customers by rental count:
/// `> high`, `low..=high`, `< low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentThresholds {
    pub high: i64,
    pub low: i64,
}

impl SegmentThresholds {
    pub fn classify(&self, rentals: i64) -> String {
        if rentals > self.high {
            self.labels()[0].clone()
        } else if rentals >= self.low {
            self.labels()[1].clone()
        } else {
            self.labels()[2].clone()
        }
    }

    /// Segment labels, heaviest renters first.
    pub fn labels(&self) -> [String; 3] {
        [
            format!("more than {}", self.high),
            format!("between {} and {}", self.low, self.high),
            format!("fewer than {}", self.low),
        ]
    }

    /// Position of `label` in `labels()`, used to order report rows.
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| l == label)
    }
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        SegmentThresholds { high: 10, low: 5 }
    }
}

// ============================================================================
// REPORT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Bikes-per-category keeps categories with strictly more bikes than this
    pub min_bikes_per_category: i64,

    pub discounts: DiscountTable,

    pub segments: SegmentThresholds,

    /// Year the membership revenue cube is restricted to
    pub cube_year: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            min_bikes_per_category: 2,
            discounts: DiscountTable::default(),
            segments: SegmentThresholds::default(),
            cube_year: 2023,
        }
    }
}

impl ReportConfig {
    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read report config: {:?}", path.as_ref()))?;

        let config: ReportConfig = serde_json::from_str(&content)
            .context("Failed to parse report config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.segments.low > self.segments.high {
            return Err(ReportError::InvalidConfig(format!(
                "segment thresholds out of order: low {} > high {}",
                self.segments.low, self.segments.high
            )));
        }
        if self.min_bikes_per_category < 0 {
            return Err(ReportError::InvalidConfig(format!(
                "min_bikes_per_category must be >= 0, got {}",
                self.min_bikes_per_category
            )));
        }
        self.discounts.validate()
    }
}
