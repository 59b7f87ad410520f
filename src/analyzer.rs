use std::path::PathBuf;

use thiserror::Error;

use crate::models::{
    AcneFinding, AggregateAcne, ImageAnalysis, OverallAnalysis, Severity, SkinAnalysis, SkinAnalysisReport,
    TreatmentRecommendation,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No images uploaded")]
    NoImages,
}

/// An uploaded photo, already written to the request's scratch directory.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub path: PathBuf,
}

const SEVERE_FACE: [&str; 3] = [
    "Benzoyl Peroxide 5-10% Treatment",
    "Prescription-strength Retinoid",
    "Medical-grade Salicylic Acid Cleanser",
];
const MODERATE_FACE: [&str; 3] = [
    "Benzoyl Peroxide 2.5-5% Cleanser",
    "Over-the-counter Retinol",
    "Tea Tree Oil Cleanser",
];
const MILD_FACE: [&str; 3] = ["Gentle Salicylic Acid Cleanser", "Niacinamide Serum", "Gentle Foaming Cleanser"];
const BODY: [&str; 3] = ["Medicated Body Wash", "Exfoliating Body Scrub", "Anti-acne Body Spray"];

/// Canned result for an upload slot. Slots past the table reuse the last
/// entry. The table follows upload order, not severity.
fn canned_analysis(slot: usize) -> SkinAnalysis {
    let entry = |hydration: &str, oiliness: &str, sensitivity: &str, severity, concerns: &[&str]| SkinAnalysis {
        hydration: hydration.to_string(),
        oiliness: oiliness.to_string(),
        sensitivity: sensitivity.to_string(),
        acne: AcneFinding { severity, location: "Face".to_string() },
        concerns: concerns.iter().map(|c| c.to_string()).collect(),
    };

    match slot {
        0 => entry("Moderate", "Moderate", "Low", Severity::Mild, &["Mild acne", "Occasional breakouts"]),
        1 => entry(
            "Low",
            "High",
            "High",
            Severity::Severe,
            &["Severe acne", "Inflammation", "Redness", "Scarring"],
        ),
        _ => entry(
            "Good",
            "Low",
            "Moderate",
            Severity::Moderate,
            &["Moderate acne", "Blackheads", "Uneven texture"],
        ),
    }
}

pub fn analyze_images(images: &[UploadedImage]) -> Result<SkinAnalysisReport, AnalysisError> {
    if images.is_empty() {
        return Err(AnalysisError::NoImages);
    }

    let details: Vec<ImageAnalysis> = images
        .iter()
        .enumerate()
        .map(|(slot, image)| {
            tracing::debug!(slot, path = %image.path.display(), "Analyzing uploaded image");
            ImageAnalysis { filename: image.filename.clone(), analysis: canned_analysis(slot) }
        })
        .collect();

    let overall = aggregate(&details);
    let recommendations = recommend(&overall.acne);

    Ok(SkinAnalysisReport { overall, details, recommendations })
}

/// Skin levels come from the last image; acne is the worst finding across
/// all images, earliest first on ties.
fn aggregate(details: &[ImageAnalysis]) -> OverallAnalysis {
    let start = AggregateAcne { severity: Severity::None, location: "N/A".to_string(), progression: false };
    let acne = details.iter().fold(start, |worst, detail| {
        let finding = &detail.analysis.acne;
        if finding.severity.rank() > worst.severity.rank() {
            AggregateAcne { severity: finding.severity, location: finding.location.clone(), progression: true }
        } else {
            worst
        }
    });

    let mut concerns: Vec<String> = Vec::new();
    for concern in details.iter().flat_map(|d| &d.analysis.concerns) {
        if !concerns.contains(concern) {
            concerns.push(concern.clone());
        }
    }

    let (hydration, oiliness, sensitivity) = match details.last() {
        Some(last) => (
            last.analysis.hydration.clone(),
            last.analysis.oiliness.clone(),
            last.analysis.sensitivity.clone(),
        ),
        None => Default::default(),
    };

    OverallAnalysis { hydration, oiliness, sensitivity, acne, concerns }
}

fn recommend(acne: &AggregateAcne) -> Vec<TreatmentRecommendation> {
    let mut recommendations = Vec::new();
    if acne.severity == Severity::None {
        return recommendations;
    }

    let to_strings = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    if matches!(acne.location.as_str(), "Face" | "Both") {
        let tier: &[&str] = match acne.severity {
            Severity::Severe => &SEVERE_FACE,
            Severity::Moderate => &MODERATE_FACE,
            _ => &MILD_FACE,
        };
        recommendations.push(TreatmentRecommendation {
            treatment_type: "Face Treatment".to_string(),
            severity: acne.severity,
            suggestions: to_strings(tier),
        });
    }

    // The canned table only ever reports "Face", so this never fires today.
    if matches!(acne.location.as_str(), "Body" | "Both") {
        recommendations.push(TreatmentRecommendation {
            treatment_type: "Body Treatment".to_string(),
            severity: acne.severity,
            suggestions: to_strings(&BODY),
        });
    }

    recommendations
}
