use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::FileStore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::instrument;

use crate::entity::{review_round_file, submission_file};
use crate::error::FileError;
use crate::genre::{Genre, GenreResolver};
use crate::model::{FileKey, PageWindow, SubmissionFile};
use crate::paths::canonical_path;
use crate::stage::{AssocType, FileStage};

/// The submission file revision store.
///
/// Persists file metadata keyed by `(file_id, revision)` and keeps the
/// backing bytes at the canonical path for each row. Row and byte mutations
/// run inside one transaction per operation, so readers never observe a
/// metadata row without its bytes.
///
/// New file ids and revision numbers are assigned as `max + 1`, a
/// read-then-write race under concurrent inserts against the same file id.
/// The store does not coordinate this; callers serialize per file id
/// externally or accept last-writer-wins.
pub struct SubmissionFileStore {
    db: DatabaseConnection,
    files: Arc<dyn FileStore>,
    genres: Arc<dyn GenreResolver>,
    context_id: i32,
}

async fn next_file_id<C: ConnectionTrait>(conn: &C) -> Result<i32, DbErr> {
    let max = submission_file::Entity::find()
        .select_only()
        .column_as(submission_file::Column::FileId.max(), "max_file_id")
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();
    Ok(max.unwrap_or(0) + 1)
}

async fn next_revision<C: ConnectionTrait>(conn: &C, file_id: i32) -> Result<i32, DbErr> {
    let max = submission_file::Entity::find()
        .filter(submission_file::Column::FileId.eq(file_id))
        .select_only()
        .column_as(submission_file::Column::Revision.max(), "max_revision")
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();
    Ok(max.unwrap_or(0) + 1)
}

fn require_key(file: &SubmissionFile) -> Result<FileKey, FileError> {
    file.key().ok_or(FileError::InvalidRevision {
        file_id: file.file_id.unwrap_or(0),
        revision: file.revision.unwrap_or(0),
    })
}

impl SubmissionFileStore {
    /// Create a store for one press context.
    pub fn new(
        db: DatabaseConnection,
        files: Arc<dyn FileStore>,
        genres: Arc<dyn GenreResolver>,
        context_id: i32,
    ) -> Self {
        Self {
            db,
            files,
            genres,
            context_id,
        }
    }

    /// Whether callers may preview the file inline.
    pub fn is_inlineable(&self, file: &SubmissionFile) -> bool {
        file.is_inlineable()
    }

    /// Empty file of the variant matching `genre_id`'s category
    /// (submission stage; the caller fills in the rest).
    pub async fn new_file_by_genre(&self, genre_id: i32) -> Result<SubmissionFile, FileError> {
        let genre = self.resolve_genre(Some(genre_id)).await?;
        let mut file = SubmissionFile::empty(genre.category, FileStage::Submission, 0);
        file.genre_id = Some(genre_id);
        Ok(file)
    }

    /// Persist a file, copying its bytes from `source`.
    ///
    /// Assigns a fresh file id (revision 1) when the draft has none, the
    /// next revision when only the file id is set, and honors both parts
    /// when present (re-inserting a previously deleted revision). The file
    /// is recast to its genre's category, so the returned variant may
    /// differ from the input's.
    ///
    /// The metadata row is only committed after the byte copy succeeds;
    /// a failed copy leaves no row behind.
    #[instrument(skip(self, file, source), fields(submission_id = file.submission_id))]
    pub async fn insert(
        &self,
        file: SubmissionFile,
        source: &Path,
    ) -> Result<SubmissionFile, FileError> {
        let genre = self.resolve_genre(file.genre_id).await?;
        let mut file = file.recast(genre.category);

        let txn = self.db.begin().await?;
        let key = match (file.file_id, file.revision) {
            (Some(file_id), Some(revision)) => FileKey { file_id, revision },
            (Some(file_id), None) => FileKey {
                file_id,
                revision: next_revision(&txn, file_id).await?,
            },
            (None, _) => FileKey {
                file_id: next_file_id(&txn).await?,
                revision: 1,
            },
        };
        file.file_id = Some(key.file_id);
        file.revision = Some(key.revision);

        file.active_model(key, genre.genre_id).insert(&txn).await?;

        let dest = self.path_for(&file, &genre, key);
        if let Err(e) = self.files.copy(source, &dest).await {
            txn.rollback().await?;
            return Err(e.into());
        }
        if let Err(e) = txn.commit().await {
            // The row is gone; don't leave orphaned bytes either.
            let _ = self.files.delete(&dest).await;
            return Err(e.into());
        }

        Ok(file)
    }

    /// Update a persisted revision in place.
    ///
    /// Re-resolves the genre: a category change recasts the file to the
    /// other variant, and any canonical-path change (category, stage)
    /// relocates the backing bytes atomically with the row update.
    #[instrument(skip(self, file))]
    pub async fn update(&self, file: SubmissionFile) -> Result<SubmissionFile, FileError> {
        let key = require_key(&file)?;
        let genre = self.resolve_genre(file.genre_id).await?;

        let prev = submission_file::Entity::find_by_id((key.file_id, key.revision))
            .one(&self.db)
            .await?
            .ok_or(FileError::InvalidRevision {
                file_id: key.file_id,
                revision: key.revision,
            })?;
        let old_path = self.path_for_row(&prev).await?;

        let file = file.recast(genre.category);
        let new_path = self.path_for(&file, &genre, key);

        let txn = self.db.begin().await?;
        file.active_model(key, genre.genre_id).update(&txn).await?;

        if old_path != new_path {
            if let Err(e) = self.files.rename(&old_path, &new_path).await {
                txn.rollback().await?;
                return Err(e.into());
            }
        }
        if let Err(e) = txn.commit().await {
            if old_path != new_path {
                let _ = self.files.rename(&new_path, &old_path).await;
            }
            return Err(e.into());
        }

        Ok(file)
    }

    /// One revision, or `None` when either id is absent or no row matches
    /// every supplied filter.
    pub async fn get_revision(
        &self,
        file_id: Option<i32>,
        revision: Option<i32>,
        file_stage: Option<FileStage>,
        submission_id: Option<i32>,
    ) -> Result<Option<SubmissionFile>, FileError> {
        let (Some(file_id), Some(revision)) = (file_id, revision) else {
            return Ok(None);
        };
        let query = Self::filtered(file_stage, submission_id)
            .filter(submission_file::Column::FileId.eq(file_id))
            .filter(submission_file::Column::Revision.eq(revision));
        Ok(query
            .one(&self.db)
            .await?
            .map(SubmissionFile::try_from)
            .transpose()?)
    }

    /// Highest revision of a file, or `None` when the id is absent or no
    /// row matches.
    pub async fn get_latest_revision(
        &self,
        file_id: Option<i32>,
        file_stage: Option<FileStage>,
        submission_id: Option<i32>,
    ) -> Result<Option<SubmissionFile>, FileError> {
        let Some(file_id) = file_id else {
            return Ok(None);
        };
        let query = Self::filtered(file_stage, submission_id)
            .filter(submission_file::Column::FileId.eq(file_id))
            .order_by_desc(submission_file::Column::Revision);
        Ok(query
            .one(&self.db)
            .await?
            .map(SubmissionFile::try_from)
            .transpose()?)
    }

    /// Highest live revision number of a file; 0 when none exist.
    pub async fn get_latest_revision_number(&self, file_id: i32) -> Result<i32, FileError> {
        let max = submission_file::Entity::find()
            .filter(submission_file::Column::FileId.eq(file_id))
            .select_only()
            .column_as(submission_file::Column::Revision.max(), "max_revision")
            .into_tuple::<Option<i32>>()
            .one(&self.db)
            .await?
            .flatten();
        Ok(max.unwrap_or(0))
    }

    /// All revisions of a file, newest first. `None` for an absent id;
    /// an empty list for a valid id with no matching rows.
    pub async fn get_all_revisions(
        &self,
        file_id: Option<i32>,
        file_stage: Option<FileStage>,
        submission_id: Option<i32>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let Some(file_id) = file_id else {
            return Ok(None);
        };
        let rows = Self::filtered(file_stage, submission_id)
            .filter(submission_file::Column::FileId.eq(file_id))
            .order_by_desc(submission_file::Column::Revision)
            .all(&self.db)
            .await?;
        Ok(Some(Self::materialize(rows)?))
    }

    /// The latest revision of every distinct file under a submission,
    /// ordered by file id, optionally windowed.
    pub async fn get_latest_revisions(
        &self,
        submission_id: Option<i32>,
        file_stage: Option<FileStage>,
        window: Option<PageWindow>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let Some(submission_id) = submission_id else {
            return Ok(None);
        };
        let rows = Self::filtered(file_stage, Some(submission_id))
            .order_by_asc(submission_file::Column::FileId)
            .order_by_desc(submission_file::Column::Revision)
            .all(&self.db)
            .await?;

        let mut latest = Vec::new();
        let mut last_id = None;
        for row in rows {
            if last_id != Some(row.file_id) {
                last_id = Some(row.file_id);
                latest.push(SubmissionFile::try_from(row)?);
            }
        }
        if let Some(window) = window {
            latest = latest
                .into_iter()
                .skip(window.offset)
                .take(window.count)
                .collect();
        }
        Ok(Some(latest))
    }

    /// Adopt the sole revision of `target_file_id` as the next revision of
    /// `source_file_id`.
    ///
    /// The adopted row inherits the source chain's genre (recast as
    /// needed); the original target row is deleted and its bytes moved to
    /// the new canonical path, all in one transaction.
    #[instrument(skip(self))]
    pub async fn set_as_latest_revision(
        &self,
        source_file_id: i32,
        target_file_id: i32,
        submission_id: i32,
        file_stage: FileStage,
    ) -> Result<SubmissionFile, FileError> {
        let txn = self.db.begin().await?;

        let target = submission_file::Entity::find()
            .filter(submission_file::Column::FileId.eq(target_file_id))
            .filter(submission_file::Column::SubmissionId.eq(submission_id))
            .filter(submission_file::Column::FileStage.eq(file_stage.as_str()))
            .order_by_desc(submission_file::Column::Revision)
            .one(&txn)
            .await?
            .ok_or(FileError::InvalidRevision {
                file_id: target_file_id,
                revision: 1,
            })?;
        let source_latest = submission_file::Entity::find()
            .filter(submission_file::Column::FileId.eq(source_file_id))
            .order_by_desc(submission_file::Column::Revision)
            .one(&txn)
            .await?
            .ok_or(FileError::InvalidRevision {
                file_id: source_file_id,
                revision: 1,
            })?;

        let genre = self.resolve_genre(Some(source_latest.genre_id)).await?;
        let old_path = self.path_for_row(&target).await?;

        let key = FileKey {
            file_id: source_file_id,
            revision: source_latest.revision + 1,
        };
        let mut adopted = SubmissionFile::try_from(target.clone())?;
        adopted.file_id = Some(key.file_id);
        adopted.revision = Some(key.revision);
        adopted.genre_id = Some(source_latest.genre_id);
        let adopted = adopted.recast(genre.category);

        submission_file::Entity::delete_by_id((target.file_id, target.revision))
            .exec(&txn)
            .await?;
        adopted
            .active_model(key, source_latest.genre_id)
            .insert(&txn)
            .await?;

        let new_path = self.path_for(&adopted, &genre, key);
        if old_path != new_path {
            if let Err(e) = self.files.rename(&old_path, &new_path).await {
                txn.rollback().await?;
                return Err(e.into());
            }
        }
        if let Err(e) = txn.commit().await {
            if old_path != new_path {
                let _ = self.files.rename(&new_path, &old_path).await;
            }
            return Err(e.into());
        }

        Ok(adopted)
    }

    /// Delete one revision. Returns the number of rows removed (0 or 1).
    #[instrument(skip(self, file))]
    pub async fn delete_revision(&self, file: &SubmissionFile) -> Result<u64, FileError> {
        match file.key() {
            Some(key) => self.delete_revision_by_id(key.file_id, key.revision).await,
            None => Ok(0),
        }
    }

    /// Delete one revision by id. Returns the number of rows removed.
    #[instrument(skip(self))]
    pub async fn delete_revision_by_id(
        &self,
        file_id: i32,
        revision: i32,
    ) -> Result<u64, FileError> {
        let Some(row) = submission_file::Entity::find_by_id((file_id, revision))
            .one(&self.db)
            .await?
        else {
            return Ok(0);
        };
        let result = submission_file::Entity::delete_by_id((file_id, revision))
            .exec(&self.db)
            .await?;
        self.remove_bytes(&[row]).await;
        Ok(result.rows_affected)
    }

    /// Delete only the highest revision of a file.
    #[instrument(skip(self))]
    pub async fn delete_latest_revision_by_id(&self, file_id: i32) -> Result<u64, FileError> {
        match self.get_latest_revision_number(file_id).await? {
            0 => Ok(0),
            revision => self.delete_revision_by_id(file_id, revision).await,
        }
    }

    /// Delete every matching revision of a file. Returns the number of
    /// rows removed; this is the only path that may leave a file id with
    /// zero revisions.
    #[instrument(skip(self))]
    pub async fn delete_all_revisions_by_id(
        &self,
        file_id: i32,
        file_stage: Option<FileStage>,
        submission_id: Option<i32>,
    ) -> Result<u64, FileError> {
        let rows = Self::filtered(file_stage, submission_id)
            .filter(submission_file::Column::FileId.eq(file_id))
            .all(&self.db)
            .await?;
        self.delete_rows(rows).await
    }

    /// Delete every revision carrying the given association.
    #[instrument(skip(self))]
    pub async fn delete_all_revisions_by_assoc_id(
        &self,
        assoc_type: AssocType,
        assoc_id: i32,
    ) -> Result<u64, FileError> {
        let rows = submission_file::Entity::find()
            .filter(submission_file::Column::AssocType.eq(assoc_type.as_str()))
            .filter(submission_file::Column::AssocId.eq(assoc_id))
            .all(&self.db)
            .await?;
        self.delete_rows(rows).await
    }

    /// Delete every file revision of a submission, cascading to its
    /// review-round assignments.
    #[instrument(skip(self))]
    pub async fn delete_all_revisions_by_submission_id(
        &self,
        submission_id: i32,
    ) -> Result<u64, FileError> {
        let rows = submission_file::Entity::find()
            .filter(submission_file::Column::SubmissionId.eq(submission_id))
            .all(&self.db)
            .await?;

        let txn = self.db.begin().await?;
        let result = submission_file::Entity::delete_many()
            .filter(submission_file::Column::SubmissionId.eq(submission_id))
            .exec(&txn)
            .await?;
        review_round_file::Entity::delete_many()
            .filter(review_round_file::Column::SubmissionId.eq(submission_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.remove_bytes(&rows).await;
        Ok(result.rows_affected)
    }

    /// The latest matching revision per file carrying the polymorphic
    /// `(assoc_type, assoc_id)` back-reference (e.g. review-assignment
    /// attachments), ordered by file id. `None` when either half of the
    /// association is absent.
    pub async fn latest_revisions_by_assoc_id(
        &self,
        assoc_type: Option<AssocType>,
        assoc_id: Option<i32>,
        file_stage: Option<FileStage>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let (Some(assoc_type), Some(assoc_id)) = (assoc_type, assoc_id) else {
            return Ok(None);
        };
        let rows = Self::filtered(file_stage, None)
            .filter(submission_file::Column::AssocType.eq(assoc_type.as_str()))
            .filter(submission_file::Column::AssocId.eq(assoc_id))
            .order_by_asc(submission_file::Column::FileId)
            .order_by_desc(submission_file::Column::Revision)
            .all(&self.db)
            .await?;

        let mut latest = Vec::new();
        let mut last_id = None;
        for row in rows {
            if last_id != Some(row.file_id) {
                last_id = Some(row.file_id);
                latest.push(SubmissionFile::try_from(row)?);
            }
        }
        Ok(Some(latest))
    }

    /// Every matching revision carrying the association, ordered by file
    /// id and then newest revision first. `None` when either half is
    /// absent.
    pub async fn all_revisions_by_assoc_id(
        &self,
        assoc_type: Option<AssocType>,
        assoc_id: Option<i32>,
        file_stage: Option<FileStage>,
    ) -> Result<Option<Vec<SubmissionFile>>, FileError> {
        let (Some(assoc_type), Some(assoc_id)) = (assoc_type, assoc_id) else {
            return Ok(None);
        };
        let rows = Self::filtered(file_stage, None)
            .filter(submission_file::Column::AssocType.eq(assoc_type.as_str()))
            .filter(submission_file::Column::AssocId.eq(assoc_id))
            .order_by_asc(submission_file::Column::FileId)
            .order_by_desc(submission_file::Column::Revision)
            .all(&self.db)
            .await?;
        Ok(Some(Self::materialize(rows)?))
    }

    /// Canonical on-disk path of a persisted file.
    pub async fn file_path(&self, file: &SubmissionFile) -> Result<PathBuf, FileError> {
        let key = require_key(file)?;
        let genre = self.resolve_genre(file.genre_id).await?;
        Ok(self.path_for(file, &genre, key))
    }

    fn materialize(
        rows: Vec<submission_file::Model>,
    ) -> Result<Vec<SubmissionFile>, FileError> {
        rows.into_iter()
            .map(|row| SubmissionFile::try_from(row).map_err(Into::into))
            .collect()
    }

    fn filtered(
        file_stage: Option<FileStage>,
        submission_id: Option<i32>,
    ) -> sea_orm::Select<submission_file::Entity> {
        let mut query = submission_file::Entity::find();
        if let Some(stage) = file_stage {
            query = query.filter(submission_file::Column::FileStage.eq(stage.as_str()));
        }
        if let Some(submission_id) = submission_id {
            query = query.filter(submission_file::Column::SubmissionId.eq(submission_id));
        }
        query
    }

    async fn resolve_genre(&self, genre_id: Option<i32>) -> Result<Genre, FileError> {
        let genre_id = genre_id.ok_or(FileError::MissingGenre)?;
        self.genres
            .genre(self.context_id, genre_id)
            .await
            .ok_or(FileError::UnknownGenre {
                genre_id,
                context_id: self.context_id,
            })
    }

    fn path_for(&self, file: &SubmissionFile, genre: &Genre, key: FileKey) -> PathBuf {
        canonical_path(
            &self.files.base_path(self.context_id),
            file.submission_id,
            file.file_stage,
            key,
            &genre.designation,
            &file.file_type,
        )
    }

    async fn path_for_row(
        &self,
        row: &submission_file::Model,
    ) -> Result<PathBuf, FileError> {
        let genre = self.resolve_genre(Some(row.genre_id)).await?;
        let file = SubmissionFile::try_from(row.clone())?;
        let key = FileKey {
            file_id: row.file_id,
            revision: row.revision,
        };
        Ok(self.path_for(&file, &genre, key))
    }

    /// Remove rows already deleted from the database, then their bytes.
    async fn delete_rows(&self, rows: Vec<submission_file::Model>) -> Result<u64, FileError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin().await?;
        for row in &rows {
            submission_file::Entity::delete_by_id((row.file_id, row.revision))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        let count = rows.len() as u64;
        self.remove_bytes(&rows).await;
        Ok(count)
    }

    /// Best-effort byte cleanup after rows are gone; failures are logged,
    /// never surfaced.
    async fn remove_bytes(&self, rows: &[submission_file::Model]) {
        for row in rows {
            match self.path_for_row(row).await {
                Ok(path) => {
                    if let Err(e) = self.files.delete(&path).await {
                        tracing::warn!(
                            file_id = row.file_id,
                            revision = row.revision,
                            "failed to delete backing file: {e}"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        file_id = row.file_id,
                        revision = row.revision,
                        "cannot resolve path of deleted revision: {e}"
                    );
                }
            }
        }
    }
}
