//! Diagnosis report: knowledge-base record rendered to a fixed-layout PDF.

pub mod layout;

use std::path::PathBuf;

use chrono::Local;

use crate::knowledge::{DiseaseRecord, KnowledgeBase, KnowledgeError};
use layout::{palette, PageWriter, Rgb8, TableStyle, Weight};

const DISCLAIMER: &str = "This report was generated by PlantCare AI using a MobileNetV2 \
    deep-learning model trained on the PlantVillage dataset. The AI confidence score reflects \
    probabilistic model output and does not constitute a definitive agronomic diagnosis. \
    Results may not account for co-infections, growth stage variation, or local environmental \
    factors. Treatment recommendations are for informational purposes only and are based on \
    generalised agronomic literature. Verify pesticide registrations and pre-harvest intervals \
    with local regulatory authorities before use. For critical crop-protection decisions \
    consult a qualified plant pathologist or certified crop adviser. PlantCare AI and its \
    developers accept no liability for crop losses, regulatory violations, or adverse outcomes \
    arising from reliance on this report.";

const CHEMICAL_NOTE: &str = "Always follow label directions. Rotate between FRAC groups to \
    prevent resistance. Strictly observe pre-harvest intervals (PHI).";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("No disease data found for '{plant} - {condition}'")]
    NoData { plant: String, condition: String },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl From<KnowledgeError> for ReportError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::NotFound { plant, condition } => ReportError::NoData { plant, condition },
        }
    }
}

/// Inputs for one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub plant: String,
    pub condition: String,
    /// Percentage, already rounded.
    pub confidence: f64,
    /// Analysed image on disk. Skipped if unreadable.
    pub image_path: Option<PathBuf>,
    /// Defaults to the current local time, e.g. "February 27, 2026 at 19:31".
    pub generated_on: Option<String>,
    /// Defaults to `PC-YYYY-MMDD-HHMM`.
    pub report_id: Option<String>,
}

impl ReportRequest {
    pub fn new(plant: impl Into<String>, condition: impl Into<String>, confidence: f64) -> Self {
        Self {
            plant: plant.into(),
            condition: condition.into(),
            confidence,
            image_path: None,
            generated_on: None,
            report_id: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

pub fn default_generated_on() -> String {
    Local::now().format("%B %d, %Y at %H:%M").to_string()
}

pub fn default_report_id() -> String {
    Local::now().format("PC-%Y-%m%d-%H%M").to_string()
}

/// Download name: `PlantCare_Report_{plant}_{condition}.pdf`, spaces as `_`.
pub fn report_filename(plant: &str, condition: &str) -> String {
    format!(
        "PlantCare_Report_{}_{}.pdf",
        plant.replace(' ', "_"),
        condition.replace(' ', "_")
    )
}

/// Look up the record for the request and render the full report.
///
/// Fails with `NoData` before any rendering when the pair is unknown.
pub fn generate_report(kb: &KnowledgeBase, request: &ReportRequest) -> Result<Vec<u8>, ReportError> {
    let record = kb.lookup(&request.plant, &request.condition)?;

    let generated_on = request
        .generated_on
        .clone()
        .unwrap_or_else(default_generated_on);
    let report_id = request.report_id.clone().unwrap_or_else(default_report_id);

    let mut w = PageWriter::new("PlantCare AI - Enhanced Diagnosis Report")?;

    render_header(&mut w);
    render_summary(&mut w, request, &report_id, &generated_on);
    if let Some(path) = &request.image_path {
        render_image(&mut w, path);
    }
    render_overview(&mut w, record);
    render_symptoms(&mut w, record);
    render_treatments(&mut w, record);
    render_risks(&mut w, record);
    render_prevention(&mut w, record);
    render_disclaimer(&mut w, &report_id, &generated_on);

    let pages = w.page_count();
    let bytes = w.finish()?;
    tracing::info!(
        key = %record.key(),
        pages,
        size = bytes.len(),
        "Diagnosis report generated"
    );
    Ok(bytes)
}

fn render_header(w: &mut PageWriter) {
    w.banner("PlantCare AI", 22.0, 14.0, palette::DARK_GREEN, palette::WHITE);
    w.banner(
        "Enhanced Plant Disease Diagnosis Report",
        11.0,
        9.0,
        palette::MID_GREEN,
        palette::LIGHT_GREEN,
    );
    w.space(4.0);
}

fn render_summary(w: &mut PageWriter, request: &ReportRequest, report_id: &str, generated_on: &str) {
    let widths = [0.28, 0.24, 0.20, 0.28];
    w.table_row(
        &cells(["Plant Type", "Condition Detected", "AI Confidence", "Report ID"]),
        &widths,
        9.0,
        Weight::Bold,
        palette::WHITE,
        palette::DARK_GREEN,
    );
    let values = vec![
        request.plant.clone(),
        request.condition.clone(),
        format!("{:.2}%", request.confidence),
        report_id.to_string(),
    ];
    w.styled_row(&values, &widths, 9.0, &|col| match col {
        1 => (Weight::Bold, palette::DANGER_RED, palette::WHITE),
        2 => (Weight::Bold, palette::DARK_GRAY, palette::WHITE),
        3 => (Weight::Regular, palette::MID_GRAY, palette::WHITE),
        _ => (Weight::Regular, palette::DARK_GRAY, palette::WHITE),
    });
    w.space(1.5);
    w.paragraph(
        &format!(
            "Generated on {generated_on}  ·  Model: MobileNetV2 (Transfer Learning) — PlantVillage Dataset"
        ),
        8.0,
        Weight::Regular,
        palette::MID_GRAY,
        0.0,
    );
    w.space(5.0);
}

fn render_image(w: &mut PageWriter, path: &std::path::Path) {
    match ::image::open(path) {
        Ok(img) => {
            w.paragraph("Analysed Leaf Image", 10.0, Weight::Bold, palette::DARK_GRAY, 0.0);
            w.space(1.5);
            w.image(&img, 70.0, 50.0);
            w.space(5.0);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable report image");
        }
    }
}

fn render_overview(w: &mut PageWriter, record: &DiseaseRecord) {
    w.section_header("1.  Scientific Overview & Pathogen Information");
    w.labelled("Causal Pathogen:", record.pathogen, 10.0);
    w.space(2.0);
    w.paragraph(record.overview, 10.0, Weight::Regular, palette::DARK_GRAY, 0.0);
    w.space(3.5);

    w.paragraph("Taxonomic Classification", 10.0, Weight::Bold, palette::DARK_GRAY, 0.0);
    w.space(1.5);
    let widths = [0.30, 0.70];
    w.table_row(
        &cells(["Rank", "Classification"]),
        &widths,
        9.0,
        Weight::Bold,
        palette::WHITE,
        palette::DARK_GREEN,
    );
    for (i, (rank, value)) in record.taxonomy.iter().enumerate() {
        let bg = if i % 2 == 0 { palette::WHITE } else { palette::LIGHT_GREEN };
        let value_weight = if matches!(*rank, "Genus" | "Species") {
            Weight::Italic
        } else {
            Weight::Regular
        };
        w.styled_row(&cells([*rank, *value]), &widths, 9.0, &|col| {
            if col == 0 {
                (Weight::Bold, palette::MID_GRAY, bg)
            } else {
                (value_weight, palette::DARK_GRAY, bg)
            }
        });
    }
    w.space(6.0);
}

fn render_symptoms(w: &mut PageWriter, record: &DiseaseRecord) {
    w.section_header("2.  Symptom Progression");
    for stage in record.symptoms {
        w.stage_bar(stage.title);
        w.paragraph(stage.description, 10.0, Weight::Regular, palette::DARK_GRAY, 3.5);
        w.space(3.5);
    }
    w.space(3.5);
}

fn render_treatments(w: &mut PageWriter, record: &DiseaseRecord) {
    w.section_header("3.  Treatment Protocols");

    w.paragraph("3a.  Organic / Biological Treatments", 10.0, Weight::Bold, palette::DARK_GRAY, 0.0);
    w.space(1.5);
    let organic: Vec<Vec<String>> = record
        .organic_treatments
        .iter()
        .map(|t| cells([t.product, t.dosage, t.frequency]))
        .collect();
    w.table(
        &["Product / Treatment", "Dosage", "Application Frequency"],
        &[0.38, 0.28, 0.34],
        &organic,
        TableStyle::default(),
    );
    w.space(4.0);

    w.paragraph("3b.  Chemical Fungicide Treatments", 10.0, Weight::Bold, palette::DARK_GRAY, 0.0);
    w.space(1.0);
    w.paragraph(CHEMICAL_NOTE, 8.0, Weight::Regular, palette::MID_GRAY, 0.0);
    w.space(1.5);
    let chemical: Vec<Vec<String>> = record
        .chemical_treatments
        .iter()
        .map(|t| cells([t.active_ingredient, t.trade_name, t.dosage, t.notes]))
        .collect();
    w.table(
        &["Active Ingredient", "Trade Name", "Dosage", "Application Notes"],
        &[0.22, 0.18, 0.18, 0.42],
        &chemical,
        TableStyle {
            header_bg: palette::WINE,
            stripe: palette::BLUSH,
        },
    );
    w.space(6.0);
}

fn render_risks(w: &mut PageWriter, record: &DiseaseRecord) {
    w.section_header("4.  Risk Assessment & Spread Patterns");
    let widths = [0.24, 0.14, 0.62];
    for risk in record.risks {
        let level_color = Rgb8::from(risk.level.color());
        let row = cells([risk.label, risk.level.label(), risk.description]);
        w.styled_row(&row, &widths, 10.0, &|col| match col {
            0 => (Weight::Bold, palette::DARK_GRAY, palette::LIGHT_GRAY),
            1 => (Weight::Bold, level_color, palette::AMBER_TINT),
            _ => (Weight::Regular, palette::DARK_GRAY, palette::LIGHT_GRAY),
        });
        w.space(1.5);
    }
    w.space(4.5);
}

fn render_prevention(w: &mut PageWriter, record: &DiseaseRecord) {
    w.section_header("5.  Prevention Guidelines");
    for (i, item) in record.prevention.iter().enumerate() {
        w.paragraph(
            &format!("{:02}.  {item}", i + 1),
            10.0,
            Weight::Regular,
            palette::DARK_GRAY,
            4.0,
        );
        w.space(1.5);
    }
    w.space(6.0);
}

fn render_disclaimer(w: &mut PageWriter, report_id: &str, generated_on: &str) {
    w.rule(palette::ACCENT_GREEN);
    w.space(3.0);
    w.paragraph("Disclaimer & Limitations", 9.0, Weight::Bold, palette::MID_GRAY, 0.0);
    w.space(1.5);
    w.paragraph(DISCLAIMER, 8.0, Weight::Regular, palette::MID_GRAY, 0.0);
    w.space(3.0);
    w.centered(
        &format!(
            "© 2026 PlantCare AI  ·  Smart Bridge Hyderabad  ·  Report ID: {report_id}  ·  {generated_on}"
        ),
        7.0,
        palette::MID_GRAY,
    );
}

fn cells<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::preprocess::sample_png;

    fn fixed_request() -> ReportRequest {
        ReportRequest {
            generated_on: Some("February 27, 2026 at 19:31".into()),
            report_id: Some("PC-2026-0227-1931".into()),
            ..ReportRequest::new("Strawberry", "Leaf scorch", 97.77)
        }
    }

    #[test]
    fn known_pair_renders_pdf() {
        let kb = KnowledgeBase::builtin();
        let bytes = generate_report(&kb, &fixed_request()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn unknown_pair_is_no_data() {
        let kb = KnowledgeBase::builtin();
        let request = ReportRequest::new("Tomato", "Late blight", 88.0);
        let err = generate_report(&kb, &request).unwrap_err();
        match err {
            ReportError::NoData { plant, condition } => {
                assert_eq!(plant, "Tomato");
                assert_eq!(condition, "Late blight");
            }
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[test]
    fn report_includes_readable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        std::fs::write(&path, sample_png(64, 48, [30, 140, 60])).unwrap();

        let kb = KnowledgeBase::builtin();
        let with_image = generate_report(&kb, &fixed_request().with_image(&path)).unwrap();
        let without = generate_report(&kb, &fixed_request()).unwrap();
        assert!(with_image.len() > without.len());
    }

    #[test]
    fn unreadable_image_is_skipped() {
        let kb = KnowledgeBase::builtin();
        let request = fixed_request().with_image("/nonexistent/leaf.jpg");
        let bytes = generate_report(&kb, &request).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn filename_replaces_spaces() {
        assert_eq!(
            report_filename("Pepper bell", "Bacterial spot"),
            "PlantCare_Report_Pepper_bell_Bacterial_spot.pdf"
        );
    }

    #[test]
    fn default_stamps_follow_formats() {
        assert!(default_report_id().starts_with("PC-"));
        assert_eq!(default_report_id().len(), "PC-2026-0227-1931".len());
        assert!(default_generated_on().contains(" at "));
    }
}
