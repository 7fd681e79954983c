//! Metric evaluators.
//!
//! Eight independently optional metrics over sampled frame data and the
//! extracted audio track. Evaluators are stateless with respect to session
//! data: they receive their typed inputs and return a [`MetricResult`],
//! never touching session state. A missing backend or missing input always
//! yields `status = error` with a direction-appropriate sentinel value -
//! no failure escapes an evaluator.

pub mod backends;
mod fid;
mod identity;
mod lpips;
mod lse;
mod niqe;
mod psnr;
mod ssim;
mod types;

pub use fid::FidEvaluator;
pub use identity::IdentityEvaluator;
pub use lpips::LpipsEvaluator;
pub use lse::{LseEvaluator, LseVariant};
pub use niqe::NiqeEvaluator;
pub use psnr::PsnrEvaluator;
pub use ssim::SsimEvaluator;
pub use types::{
    score_stats, DataRequirement, Direction, MetricKind, MetricResult, MetricStatus, ScoreStats,
};

use std::io;
use std::path::{Path, PathBuf};

use image::DynamicImage;

/// Write frames as numbered PNGs into `dir`, returning the written paths.
pub(crate) fn write_frame_images(
    frames: &[DynamicImage],
    dir: &Path,
    prefix: &str,
) -> io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("{}_{:04}.png", prefix, i));
        frame
            .save(&path)
            .map_err(|e| io::Error::other(format!("failed to save {}: {}", path.display(), e)))?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn write_frame_images_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        let frames = vec![
            DynamicImage::ImageRgb8(RgbImage::new(8, 8)),
            DynamicImage::ImageRgb8(RgbImage::new(8, 8)),
        ];
        let paths = write_frame_images(&frames, dir.path(), "gen").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("gen_0000.png"));
        assert!(paths.iter().all(|p| p.exists()));
    }
}
