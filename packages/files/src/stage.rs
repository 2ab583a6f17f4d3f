use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow stage bucket a submission file belongs to.
///
/// Stored as its string value in the `submission_file` table; the value also
/// determines the directory segment of the canonical on-disk path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    Submission,
    ReviewFile,
    ReviewAttachment,
    ReviewRevision,
    Final,
    Copyedit,
    Proof,
    ProductionReady,
    Attachment,
    Dependent,
}

impl FileStage {
    /// All file stages, in workflow order.
    pub const ALL: &'static [FileStage] = &[
        Self::Submission,
        Self::ReviewFile,
        Self::ReviewAttachment,
        Self::ReviewRevision,
        Self::Final,
        Self::Copyedit,
        Self::Proof,
        Self::ProductionReady,
        Self::Attachment,
        Self::Dependent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::ReviewFile => "review_file",
            Self::ReviewAttachment => "review_attachment",
            Self::ReviewRevision => "review_revision",
            Self::Final => "final",
            Self::Copyedit => "copyedit",
            Self::Proof => "proof",
            Self::ProductionReady => "production_ready",
            Self::Attachment => "attachment",
            Self::Dependent => "dependent",
        }
    }

    /// Directory segment under a submission's file area.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::ReviewFile => "submission/review",
            Self::ReviewAttachment => "submission/review/attachment",
            Self::ReviewRevision => "submission/review/revision",
            Self::Final => "submission/final",
            Self::Copyedit => "submission/copyedit",
            Self::Proof => "submission/proof",
            Self::ProductionReady => "submission/productionReady",
            Self::Attachment => "attachment",
            Self::Dependent => "submission/dependent",
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown file stage: {s}"))
    }
}

/// Workflow stage a review round belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Submission,
    InternalReview,
    ExternalReview,
    Editing,
    Production,
}

impl WorkflowStage {
    pub const ALL: &'static [WorkflowStage] = &[
        Self::Submission,
        Self::InternalReview,
        Self::ExternalReview,
        Self::Editing,
        Self::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::InternalReview => "internal_review",
            Self::ExternalReview => "external_review",
            Self::Editing => "editing",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown workflow stage: {s}"))
    }
}

/// Type half of the polymorphic `(assoc_type, assoc_id)` back-reference
/// tying a file revision to an owning entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssocType {
    ReviewAssignment,
    ReviewRound,
    Note,
}

impl AssocType {
    pub const ALL: &'static [AssocType] = &[Self::ReviewAssignment, Self::ReviewRound, Self::Note];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReviewAssignment => "review_assignment",
            Self::ReviewRound => "review_round",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for AssocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown assoc type: {s}"))
    }
}
