use common::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failures surfaced by the revision store and review-round binder.
///
/// "Not found" on queries is never an error here: lookups return `None`
/// (or `Some` of an empty collection for valid queries with no rows).
/// Errors are reserved for malformed input and I/O or database faults.
#[derive(Debug, Error)]
pub enum FileError {
    /// A file was handed to `insert` without a genre assigned.
    #[error("submission file has no genre assigned")]
    MissingGenre,

    /// The genre id is not registered for the owning press context.
    #[error("genre {genre_id} is not registered for press {context_id}")]
    UnknownGenre { genre_id: i32, context_id: i32 },

    /// An operation referenced a nonexistent (file id, revision) pair.
    #[error("no revision {revision} of file {file_id}")]
    InvalidRevision { file_id: i32, revision: i32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Db(#[from] DbErr),
}
