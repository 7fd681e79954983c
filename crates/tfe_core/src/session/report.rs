//! Report persistence.
//!
//! Each session writes a structured JSON report plus a flattened CSV
//! summary, named after the generated video's stem. A persistence failure
//! is reported to the caller but never invalidates the in-memory results.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::metrics::MetricStatus;

use super::types::EvaluationSession;

/// Error types for report persistence.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// IO failure while writing or reading a report.
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths of the artifacts one session persisted.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// Structured JSON report.
    pub json: PathBuf,
    /// Flattened CSV summary.
    pub csv: PathBuf,
    /// Saved identity source frame, when one was used.
    pub identity_image: Option<PathBuf>,
}

/// Persist a session's JSON report, CSV summary and identity frame.
pub fn save_report(
    session: &EvaluationSession,
    output_dir: &Path,
    identity_frame: Option<&DynamicImage>,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(output_dir)?;
    let stem = &session.video_info.video_name;

    let json_path = output_dir.join(format!("{}_results.json", stem));
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(&json_path, json)?;

    let csv_path = output_dir.join(format!("{}_summary.csv", stem));
    std::fs::write(&csv_path, render_csv(session))?;

    let identity_path = match identity_frame {
        Some(frame) => {
            let path = output_dir.join(format!("{}_identity.png", stem));
            if let Err(e) = frame.save(&path) {
                tracing::warn!("Failed to save identity frame: {}", e);
                None
            } else {
                Some(path)
            }
        }
        None => None,
    };

    tracing::info!("Report written: {}", json_path.display());

    Ok(ReportPaths {
        json: json_path,
        csv: csv_path,
        identity_image: identity_path,
    })
}

/// Reload a persisted JSON report.
pub fn load_report(path: &Path) -> Result<EvaluationSession, ReportError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

const CSV_SEPARATOR_ROW: &str = "--------------------";

/// Render the flattened CSV summary.
///
/// Layout: header rows identifying the videos, a separator, one row per
/// computed metric, a separator, then the overall score and interpretation.
fn render_csv(session: &EvaluationSession) -> String {
    let info = &session.video_info;
    let mut rows: Vec<(String, String)> = vec![
        ("Metric".to_string(), "Value".to_string()),
        ("Video Name".to_string(), info.video_name.clone()),
        (
            "Reference Video".to_string(),
            info.reference_video
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ),
        (
            "Generated Video".to_string(),
            info.generated_video.display().to_string(),
        ),
        ("Evaluation Time".to_string(), info.evaluation_time.clone()),
        (CSV_SEPARATOR_ROW.to_string(), CSV_SEPARATOR_ROW.to_string()),
    ];

    for result in session.metrics.values() {
        if result.status == MetricStatus::Success {
            rows.push((result.name.clone(), format!("{:.4}", result.value)));
        } else {
            rows.push((result.name.clone(), "error".to_string()));
        }
    }

    rows.push((CSV_SEPARATOR_ROW.to_string(), CSV_SEPARATOR_ROW.to_string()));
    rows.push((
        "Overall Score".to_string(),
        format!("{:.4}", session.summary.overall_score),
    ));
    rows.push((
        "Interpretation".to_string(),
        session.summary.interpretation.clone(),
    ));

    rows.iter()
        .map(|(k, v)| format!("{},{}\n", csv_field(k), csv_field(v)))
        .collect()
}

/// Quote a CSV field when it contains a delimiter or quote.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::metrics::{MetricKind, MetricResult};
    use crate::session::types::{Summary, VideoInfo};
    use std::collections::BTreeMap;

    fn session() -> EvaluationSession {
        EvaluationSession {
            video_info: VideoInfo {
                video_name: "clip".to_string(),
                generated_video: PathBuf::from("/videos/clip.mp4"),
                reference_video: Some(PathBuf::from("/videos/ref.mp4")),
                generated_info: None,
                reference_info: None,
                evaluation_time: "2024-01-01 12:00:00".to_string(),
                config: Settings::default(),
            },
            metrics: BTreeMap::from([
                (
                    "ssim".to_string(),
                    MetricResult::success(MetricKind::Ssim, 0.912345),
                ),
                (
                    "fid".to_string(),
                    MetricResult::error(MetricKind::Fid, "backend missing"),
                ),
            ]),
            summary: Summary {
                overall_score: 0.912345,
                weights: BTreeMap::from([("ssim".to_string(), 1.0)]),
                valid_metrics: vec!["ssim".to_string()],
                interpretation: "excellent: generation quality is very high".to_string(),
                calculation_time: "2024-01-01 12:00:01".to_string(),
            },
        }
    }

    #[test]
    fn json_report_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let session = session();
        let paths = save_report(&session, dir.path(), None).unwrap();

        let reloaded = load_report(&paths.json).unwrap();
        assert!((reloaded.summary.overall_score - session.summary.overall_score).abs() < 1e-6);
        for (name, result) in &session.metrics {
            let other = &reloaded.metrics[name];
            if result.value.is_finite() {
                assert!((other.value - result.value).abs() < 1e-6);
            } else {
                assert!(other.value.is_infinite());
            }
        }
    }

    #[test]
    fn csv_contains_metric_and_overall_rows() {
        let csv = render_csv(&session());
        assert!(csv.starts_with("Metric,Value\n"));
        assert!(csv.contains("Video Name,clip\n"));
        assert!(csv.contains("SSIM,0.9123\n"));
        assert!(csv.contains("FID,error\n"));
        assert!(csv.contains("Overall Score,0.9123\n"));
        assert!(csv.contains("Interpretation,"));
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn identity_frame_is_saved_when_provided() {
        let dir = tempfile::tempdir().unwrap();
        let frame = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let paths = save_report(&session(), dir.path(), Some(&frame)).unwrap();
        let identity = paths.identity_image.unwrap();
        assert!(identity.exists());
        assert!(identity.ends_with("clip_identity.png"));
    }
}
