//! Audio-visual synchronization feature matching and LSE scoring.
//!
//! The feature model itself (audio/video embedding sequences and their
//! cross-correlation alignment search) is an external pretrained component;
//! this module defines its contract (`model`) and derives the LSE-C and
//! LSE-D scores from its output profile (`scoring`).

mod model;
mod scoring;

pub use model::{SyncFeatureModel, SyncModelConfig, SyncProfile};
pub use scoring::{lse_confidence_score, lse_distance_score};
