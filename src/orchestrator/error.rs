use std::fmt;

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::similarity::SimilarityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Which upstream call an orchestration failure came from.
pub enum BranchKind {
    Quality,
    Authenticity,
    Embedding,
    Hint,
    StyleAnalysis,
    TaskGeneration,
    TaskAdaptation,
    Dialogue,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::Quality => "quality",
            BranchKind::Authenticity => "authenticity",
            BranchKind::Embedding => "embedding",
            BranchKind::Hint => "hint",
            BranchKind::StyleAnalysis => "style_analysis",
            BranchKind::TaskGeneration => "task_generation",
            BranchKind::TaskAdaptation => "task_adaptation",
            BranchKind::Dialogue => "dialogue",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
/// Errors returned by [`super::Orchestrator`].
pub enum OrchestratorError {
    /// An upstream call failed.
    #[error("{branch} branch failed: {source}")]
    Branch {
        branch: BranchKind,
        #[source]
        source: GatewayError,
    },

    /// The model answered, but not with the structure asked for.
    #[error("{branch} branch returned an invalid assessment: {reason}")]
    InvalidAssessment { branch: BranchKind, reason: String },

    /// Similarity index failure outside an evaluation branch, such as indexing a
    /// known solution.
    #[error("similarity index error: {0}")]
    Similarity(#[from] SimilarityError),
}

impl OrchestratorError {
    pub(crate) fn branch(branch: BranchKind) -> impl FnOnce(GatewayError) -> Self {
        move |source| OrchestratorError::Branch { branch, source }
    }

    /// Branch the failure is attributed to, if any.
    pub fn branch_kind(&self) -> Option<BranchKind> {
        match self {
            OrchestratorError::Branch { branch, .. }
            | OrchestratorError::InvalidAssessment { branch, .. } => Some(*branch),
            OrchestratorError::Similarity(_) => None,
        }
    }
}

/// Convenience result type for orchestration.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
