//! Batch evaluation over paired directories.
//!
//! Reference and generated videos are paired by identical file stems;
//! unmatched files are silently skipped. Pairs are evaluated strictly one
//! after another and a single pair's failure never halts the batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Settings;

use super::orchestrator::EvaluationOrchestrator;
use super::types::EvaluationSession;

/// Recognized video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Error types for batch evaluation.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A batch input directory does not exist.
    #[error("Directory not found: {0}")]
    DirectoryMissing(String),

    /// A directory contained no video files.
    #[error("No video files found in {0}")]
    NoVideos(String),

    /// No reference/generated pair shared a file stem.
    #[error("No matched video pairs between the two directories")]
    NoPairs,

    /// IO error while scanning directories.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One reference/generated pair matched by stem.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPair {
    /// Shared file stem.
    pub name: String,
    /// Reference video path.
    pub reference: PathBuf,
    /// Generated video path.
    pub generated: PathBuf,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of pairs found.
    pub total_pairs: usize,
    /// Pairs that evaluated successfully.
    pub successful: usize,
    /// Pairs that failed.
    pub failed: usize,
    /// Per-video sessions, keyed by the pair's stem.
    pub results: BTreeMap<String, EvaluationSession>,
}

/// Find video files in a directory, sorted by path.
pub fn find_video_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::DirectoryMissing(dir.display().to_string()));
    }

    let mut videos: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    videos.sort();
    Ok(videos)
}

/// Pair reference and generated videos by identical file stem.
///
/// Files without a counterpart in the other directory are skipped.
pub fn pair_by_stem(
    reference_dir: &Path,
    generated_dir: &Path,
) -> Result<Vec<VideoPair>, BatchError> {
    let references = find_video_files(reference_dir)?;
    let generated = find_video_files(generated_dir)?;

    if references.is_empty() {
        return Err(BatchError::NoVideos(reference_dir.display().to_string()));
    }
    if generated.is_empty() {
        return Err(BatchError::NoVideos(generated_dir.display().to_string()));
    }

    let mut pairs = Vec::new();
    for reference in &references {
        let Some(stem) = reference.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let candidate = generated.iter().find(|g| {
            g.file_stem()
                .map(|s| s.to_string_lossy().as_ref() == stem.as_str())
                .unwrap_or(false)
        });
        match candidate {
            Some(generated) => pairs.push(VideoPair {
                name: stem,
                reference: reference.clone(),
                generated: generated.clone(),
            }),
            None => tracing::debug!("No generated counterpart for {}", reference.display()),
        }
    }

    if pairs.is_empty() {
        return Err(BatchError::NoPairs);
    }

    tracing::info!(
        "Matched {} pair(s) from {} reference / {} generated videos",
        pairs.len(),
        references.len(),
        generated.len()
    );
    Ok(pairs)
}

/// Evaluate every matched pair sequentially.
///
/// A fresh orchestrator (and evaluator registry) is built per pair; a
/// pair's failure is logged and counted without halting the batch. The
/// summary is persisted as `batch_summary.json` in the output directory.
pub fn run_batch(
    settings: &Settings,
    reference_dir: &Path,
    generated_dir: &Path,
) -> Result<BatchSummary, BatchError> {
    let pairs = pair_by_stem(reference_dir, generated_dir)?;

    let mut summary = BatchSummary {
        total_pairs: pairs.len(),
        successful: 0,
        failed: 0,
        results: BTreeMap::new(),
    };

    for (i, pair) in pairs.iter().enumerate() {
        tracing::info!(
            "Evaluating pair {}/{}: {}",
            i + 1,
            pairs.len(),
            pair.name
        );

        let mut orchestrator = EvaluationOrchestrator::new(settings.clone());
        let outcome = orchestrator
            .bind_media(&pair.generated, Some(&pair.reference), None)
            .and_then(|_| orchestrator.evaluate());

        match outcome {
            Ok(session) => {
                summary.results.insert(pair.name.clone(), session);
                summary.successful += 1;
            }
            Err(e) => {
                tracing::warn!("Pair '{}' failed: {}", pair.name, e);
                summary.failed += 1;
            }
        }
    }

    let output_dir = PathBuf::from(&settings.output.output_dir);
    if let Err(e) = persist_summary(&summary, &output_dir) {
        tracing::warn!("Failed to persist batch summary: {}", e);
    }

    Ok(summary)
}

/// Write `batch_summary.json` into the output directory.
fn persist_summary(summary: &BatchSummary, output_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join("batch_summary.json");
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(&path, json)?;
    tracing::info!("Batch summary written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"stub").unwrap();
    }

    #[test]
    fn find_video_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.MKV");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "c.wav");

        let videos = find_video_files(dir.path()).unwrap();
        assert_eq!(videos.len(), 2);
    }

    #[test]
    fn find_video_files_rejects_missing_dir() {
        let result = find_video_files(Path::new("/nonexistent/dir"));
        assert!(matches!(result, Err(BatchError::DirectoryMissing(_))));
    }

    #[test]
    fn pairing_matches_identical_stems_only() {
        let refs = tempfile::tempdir().unwrap();
        let gens = tempfile::tempdir().unwrap();
        touch(refs.path(), "a.mp4");
        touch(refs.path(), "b.mp4");
        touch(gens.path(), "a.mp4");
        touch(gens.path(), "c.mp4");

        let pairs = pair_by_stem(refs.path(), gens.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "a");
        assert!(pairs[0].reference.ends_with("a.mp4"));
        assert!(pairs[0].generated.ends_with("a.mp4"));
    }

    #[test]
    fn pairing_matches_across_extensions() {
        let refs = tempfile::tempdir().unwrap();
        let gens = tempfile::tempdir().unwrap();
        touch(refs.path(), "clip.mkv");
        touch(gens.path(), "clip.mp4");

        let pairs = pair_by_stem(refs.path(), gens.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "clip");
    }

    #[test]
    fn no_common_stem_is_an_error() {
        let refs = tempfile::tempdir().unwrap();
        let gens = tempfile::tempdir().unwrap();
        touch(refs.path(), "a.mp4");
        touch(gens.path(), "b.mp4");

        let result = pair_by_stem(refs.path(), gens.path());
        assert!(matches!(result, Err(BatchError::NoPairs)));
    }

    #[test]
    fn empty_generated_dir_is_an_error() {
        let refs = tempfile::tempdir().unwrap();
        let gens = tempfile::tempdir().unwrap();
        touch(refs.path(), "a.mp4");

        let result = pair_by_stem(refs.path(), gens.path());
        assert!(matches!(result, Err(BatchError::NoVideos(_))));
    }

    #[test]
    fn batch_summary_serializes() {
        let summary = BatchSummary {
            total_pairs: 2,
            successful: 1,
            failed: 1,
            results: BTreeMap::new(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_pairs\":2"));
    }
}
