//! Per-image results of one sync run.

use super::PipelineError;
use crate::store::domain::ImageName;

/// Result of mirroring one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    /// Source image.
    pub image: ImageName,
    /// Push target derived from the source.
    pub target: String,
    /// `Ok` when pull, tag and push all succeeded.
    pub result: Result<(), PipelineError>,
}

/// Every image outcome of a run, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    outcomes: Vec<ImageOutcome>,
}

impl SyncSummary {
    /// Wraps outcomes collected in completion order.
    #[must_use]
    pub const fn new(outcomes: Vec<ImageOutcome>) -> Self {
        Self { outcomes }
    }

    /// Returns the outcomes in completion order.
    #[must_use]
    pub fn outcomes(&self) -> &[ImageOutcome] {
        &self.outcomes
    }

    /// Number of images that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }

    /// Returns `true` when every image succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Collapses the run into one result.
    ///
    /// # Errors
    ///
    /// Returns the first failure to complete, when there is one.
    pub fn into_result(self) -> Result<(), PipelineError> {
        self.outcomes
            .into_iter()
            .find_map(|outcome| outcome.result.err())
            .map_or(Ok(()), Err)
    }
}
