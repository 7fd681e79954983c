//! Evaluation sessions: orchestration, aggregation, reporting and batch runs.
//!
//! One [`EvaluationSession`] binds a generated video (required), an optional
//! reference video and a configuration, accumulates one [`MetricResult`] per
//! requested metric, and derives a weighted [`Summary`]. The orchestrator
//! owns the session exclusively; evaluators never touch it.
//!
//! [`MetricResult`]: crate::metrics::MetricResult

mod aggregate;
mod batch;
mod orchestrator;
mod report;
mod types;

pub use aggregate::{interpret_overall, normalized_score, summarize, CANNOT_COMPUTE};
pub use batch::{find_video_files, pair_by_stem, run_batch, BatchError, BatchSummary, VideoPair};
pub use orchestrator::EvaluationOrchestrator;
pub use report::{load_report, save_report, ReportError, ReportPaths};
pub use types::{EvaluationSession, SessionError, SessionState, Summary, VideoInfo};
