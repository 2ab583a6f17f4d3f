use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::instrument;

use crate::entity::{review_round_file, submission_file};
use crate::error::FileError;
use crate::model::SubmissionFile;
use crate::stage::WorkflowStage;

/// Associates file revisions with review rounds.
///
/// An assignment pins one specific revision of a file to a `(stage, round)`
/// pair; later revisions of the same file stay unassigned until an editor
/// re-pins them, which is what makes "new revisions since this round"
/// discoverable.
pub struct ReviewRoundBinder {
    db: DatabaseConnection,
}

impl ReviewRoundBinder {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pin a revision to a review round, replacing any revision of the
    /// same file already pinned there.
    #[instrument(skip(self))]
    pub async fn assign_revision(
        &self,
        file_id: i32,
        revision: i32,
        stage_id: WorkflowStage,
        round: i32,
        submission_id: i32,
    ) -> Result<(), FileError> {
        submission_file::Entity::find_by_id((file_id, revision))
            .one(&self.db)
            .await?
            .ok_or(FileError::InvalidRevision { file_id, revision })?;

        let assignment = review_round_file::ActiveModel {
            file_id: Set(file_id),
            stage_id: Set(stage_id.to_string()),
            round: Set(round),
            revision: Set(revision),
            submission_id: Set(submission_id),
        };
        review_round_file::Entity::insert(assignment)
            .on_conflict(
                OnConflict::columns([
                    review_round_file::Column::FileId,
                    review_round_file::Column::StageId,
                    review_round_file::Column::Round,
                ])
                .update_columns([
                    review_round_file::Column::Revision,
                    review_round_file::Column::SubmissionId,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// The exact revisions pinned to a round, ordered by file id. `None`
    /// when stage or round is absent.
    pub async fn revisions_by_review_round(
        &self,
        submission_id: i32,
        stage_id: Option<WorkflowStage>,
        round: Option<i32>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let Some(assignments) = self.assignments(submission_id, stage_id, round).await? else {
            return Ok(None);
        };

        let mut files = Vec::new();
        for assignment in assignments {
            let row = submission_file::Entity::find_by_id((assignment.file_id, assignment.revision))
                .one(&self.db)
                .await?;
            if let Some(row) = row {
                files.push(SubmissionFile::try_from(row)?);
            }
        }
        Ok(Some(files))
    }

    /// For every file pinned to a round, its latest revision when that
    /// revision is strictly newer than the pinned one. `None` when stage
    /// or round is absent.
    pub async fn latest_new_revisions(
        &self,
        submission_id: i32,
        stage_id: Option<WorkflowStage>,
        round: Option<i32>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let Some(assignments) = self.assignments(submission_id, stage_id, round).await? else {
            return Ok(None);
        };

        let mut files = Vec::new();
        for assignment in assignments {
            let latest = submission_file::Entity::find()
                .filter(submission_file::Column::FileId.eq(assignment.file_id))
                .filter(submission_file::Column::SubmissionId.eq(submission_id))
                .order_by_desc(submission_file::Column::Revision)
                .one(&self.db)
                .await?;
            if let Some(row) = latest {
                if row.revision > assignment.revision {
                    files.push(SubmissionFile::try_from(row)?);
                }
            }
        }
        Ok(Some(files))
    }

    /// Unpin every file from a round. Assignment rows only; the underlying
    /// file revisions stay untouched.
    #[instrument(skip(self))]
    pub async fn delete_by_review_round(
        &self,
        submission_id: i32,
        stage_id: WorkflowStage,
        round: i32,
    ) -> Result<u64, FileError> {
        let result = review_round_file::Entity::delete_many()
            .filter(review_round_file::Column::SubmissionId.eq(submission_id))
            .filter(review_round_file::Column::StageId.eq(stage_id.as_str()))
            .filter(review_round_file::Column::Round.eq(round))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn assignments(
        &self,
        submission_id: i32,
        stage_id: Option<WorkflowStage>,
        round: Option<i32>,
    ) -> Result<Option<Vec<review_round_file::Model>>, FileError> {
        let (Some(stage_id), Some(round)) = (stage_id, round) else {
            return Ok(None);
        };
        let assignments = review_round_file::Entity::find()
            .filter(review_round_file::Column::SubmissionId.eq(submission_id))
            .filter(review_round_file::Column::StageId.eq(stage_id.as_str()))
            .filter(review_round_file::Column::Round.eq(round))
            .order_by_asc(review_round_file::Column::FileId)
            .all(&self.db)
            .await?;
        Ok(Some(assignments))
    }
}
