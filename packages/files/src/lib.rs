//! Versioned submission-file storage for the press workflow.
//!
//! Every uploaded monograph document or artwork file lives as a chain of
//! revisions keyed by `(file_id, revision)`. The file's genre decides its
//! concrete variant (document vs. artwork); changing the genre on a later
//! revision or an update recasts the file to the other variant. Specific
//! revisions can be pinned to review rounds, and files can carry a
//! polymorphic back-reference to an owning entity such as a review
//! assignment.

pub mod entity;
pub mod error;
pub mod genre;
pub mod model;
pub mod paths;
pub mod review_rounds;
pub mod stage;
pub mod store;

pub use error::FileError;
pub use genre::{Genre, GenreCategory, GenreResolver, StaticGenreRegistry};
pub use model::{ArtworkMeta, FileKey, FileVariant, PageWindow, SubmissionFile};
pub use review_rounds::ReviewRoundBinder;
pub use stage::{AssocType, FileStage, WorkflowStage};
pub use store::SubmissionFileStore;
