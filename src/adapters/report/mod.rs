//! Report adapter: plain-text assessment report.
//!
//! Printable layout for the clinic desk. Rich formats (PDF) are produced outside
//! this crate from the same sections.

use std::convert::Infallible;
use std::fmt::Write as _;

use crate::ports::{ReportInput, ReportRenderer};

const TITLE: &str = "Diabetes Risk Assessment Report";
const SUBTITLE: &str = "AI-based Preventive Health Report";
const DISCLAIMER: &str = "This report is for informational purposes only. \
It does not constitute a medical diagnosis.";

/// Width of section underlines.
const RULE_WIDTH: usize = 48;

/// Renders reports as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl TextReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.len().min(RULE_WIDTH)));
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

impl ReportRenderer for TextReportRenderer {
    type Error = Infallible;

    fn render(&self, input: &ReportInput<'_>) -> Result<Vec<u8>, Self::Error> {
        let mut out = String::new();
        let attrs = input.attributes;
        let identity = input.identity;

        let _ = writeln!(out, "{TITLE}");
        let _ = writeln!(out, "{}", "=".repeat(TITLE.len()));
        let _ = writeln!(out, "{SUBTITLE}");
        out.push('\n');

        heading(&mut out, "Patient Details");
        let _ = writeln!(out, "Patient ID: {}", identity.patient_id);
        if let Some(name) = identity.name.as_deref() {
            let _ = writeln!(out, "Name: {name}");
        }
        if let Some(mobile) = identity.mobile.as_deref() {
            let _ = writeln!(out, "Mobile: {mobile}");
        }
        let _ = writeln!(out, "Gender: {}", attrs.gender);
        let _ = writeln!(out, "Age: {}", attrs.age);
        out.push('\n');

        heading(&mut out, "Clinical Measurements");
        let _ = writeln!(out, "BMI: {}", attrs.bmi);
        let _ = writeln!(out, "HbA1c: {} %", attrs.hba1c_level);
        let _ = writeln!(out, "Blood Glucose: {} mg/dL", attrs.blood_glucose_level);
        let _ = writeln!(out, "Hypertension: {}", yes_no(attrs.hypertension));
        let _ = writeln!(out, "Heart Disease: {}", yes_no(attrs.heart_disease));
        let _ = writeln!(out, "Smoking History: {}", attrs.smoking_history);
        out.push('\n');

        heading(&mut out, "Risk Outcome");
        let _ = writeln!(out, "Risk Probability: {:.2} %", input.risk.percent());
        let _ = writeln!(out, "Risk Category: {}", input.risk.category);
        let _ = writeln!(
            out,
            "Severity: {} (urgency: {})",
            input.severity.label, input.severity.urgency
        );
        let _ = writeln!(
            out,
            "Recommended Action: {}",
            input.severity.recommended_action
        );
        out.push('\n');

        heading(&mut out, "AI Explanation");
        let _ = writeln!(out, "{}", input.explanation.trim());
        out.push('\n');

        if !input.next_steps.is_empty() {
            heading(&mut out, "Next Steps");
            for step in input.next_steps {
                let _ = writeln!(out, "- {step}");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{DISCLAIMER}");
        let _ = writeln!(
            out,
            "Generated on: {}",
            input.generated_at.format("%d-%m-%Y %H:%M")
        );

        Ok(out.into_bytes())
    }

    fn file_name(&self, patient_id: &str) -> String {
        format!("{patient_id}_report.txt")
    }
}
