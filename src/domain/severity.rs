//! Severity classification: probability to urgency and recommended action.
//!
//! Five contiguous percentage bands, finer than [`RiskCategory`](super::RiskCategory)
//! and independent of it.

use serde::Serialize;

/// Severity/urgency tuple for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityResult {
    /// 0 (Normal) to 4 (Critical)
    pub level: u8,
    pub label: &'static str,
    pub urgency: &'static str,
    pub recommended_action: &'static str,
    pub color_tag: &'static str,
}

/// One row of the severity table, covering `[lower_pct, next band's lower_pct)`.
#[derive(Debug, Clone, Copy)]
pub struct SeverityBand {
    pub lower_pct: f64,
    pub level: u8,
    pub label: &'static str,
    pub urgency: &'static str,
    pub recommended_action: &'static str,
    pub color_tag: &'static str,
}

pub const SEVERITY_BANDS: [SeverityBand; 5] = [
    SeverityBand {
        lower_pct: 0.0,
        level: 0,
        label: "Normal",
        urgency: "None",
        recommended_action: "Maintain healthy lifestyle",
        color_tag: "green",
    },
    SeverityBand {
        lower_pct: 20.0,
        level: 1,
        label: "Mild Risk",
        urgency: "Low",
        recommended_action: "Lifestyle modification recommended",
        color_tag: "lime",
    },
    SeverityBand {
        lower_pct: 40.0,
        level: 2,
        label: "Moderate Risk",
        urgency: "Medium",
        recommended_action: "Regular monitoring & medical advice",
        color_tag: "orange",
    },
    SeverityBand {
        lower_pct: 60.0,
        level: 3,
        label: "High Risk",
        urgency: "High",
        recommended_action: "Doctor consultation advised",
        color_tag: "red",
    },
    SeverityBand {
        lower_pct: 80.0,
        level: 4,
        label: "Critical Risk",
        urgency: "Critical",
        recommended_action: "Immediate medical attention required",
        color_tag: "darkred",
    },
];

impl From<&SeverityBand> for SeverityResult {
    fn from(band: &SeverityBand) -> Self {
        Self {
            level: band.level,
            label: band.label,
            urgency: band.urgency,
            recommended_action: band.recommended_action,
            color_tag: band.color_tag,
        }
    }
}

/// Classify a probability in [0, 1].
#[must_use]
pub fn classify(probability: f64) -> SeverityResult {
    // Snap away binary noise so that e.g. 0.6 lands on 60, not 59.999...
    let pct = (probability * 100.0 * PCT_SNAP).round() / PCT_SNAP;
    classify_percent(pct)
}

const PCT_SNAP: f64 = 1e9;

/// Classify a percentage in [0, 100].
///
/// Values below 0 fall in the first band and values above 100 in the last,
/// so the function is total.
#[must_use]
pub fn classify_percent(pct: f64) -> SeverityResult {
    let idx = SEVERITY_BANDS.partition_point(|band| band.lower_pct <= pct);
    SeverityResult::from(&SEVERITY_BANDS[idx.saturating_sub(1)])
}
