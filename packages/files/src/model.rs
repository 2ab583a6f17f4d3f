use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{DbErr, Set};
use serde::{Deserialize, Serialize};

use crate::entity::submission_file;
use crate::genre::GenreCategory;
use crate::stage::{AssocType, FileStage};

/// Composite identity of one persisted file revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileKey {
    pub file_id: i32,
    pub revision: i32,
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.file_id, self.revision)
    }
}

/// Artwork-only metadata. Lost on recast to a document and never restored
/// by a later recast back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkMeta {
    pub caption: Option<String>,
    pub credit: Option<String>,
    pub copyright_owner: Option<String>,
    pub permission_terms: Option<String>,
    pub original_file_name: Option<String>,
}

/// Variant payload of a submission file, tagged by genre category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileVariant {
    Document,
    Artwork(ArtworkMeta),
}

impl FileVariant {
    /// Fresh variant for a category, with variant-exclusive fields empty.
    pub fn empty(category: GenreCategory) -> Self {
        match category {
            GenreCategory::Document => Self::Document,
            GenreCategory::Artwork => Self::Artwork(ArtworkMeta::default()),
        }
    }

    pub fn category(&self) -> GenreCategory {
        match self {
            Self::Document => GenreCategory::Document,
            Self::Artwork(_) => GenreCategory::Artwork,
        }
    }
}

/// A submission file revision: common fields plus the variant payload.
///
/// Draft objects (not yet persisted) carry `None` for `file_id` and
/// `revision`; the store assigns both on insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub file_id: Option<i32>,
    pub revision: Option<i32>,
    pub submission_id: i32,
    pub file_stage: FileStage,
    /// Classification driving the variant; required before insert.
    pub genre_id: Option<i32>,
    pub name: String,
    /// MIME content type.
    pub file_type: String,
    pub file_size: i64,
    pub date_uploaded: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    pub assoc_type: Option<AssocType>,
    pub assoc_id: Option<i32>,
    pub variant: FileVariant,
}

impl SubmissionFile {
    /// Empty file of the given category.
    pub fn empty(category: GenreCategory, file_stage: FileStage, submission_id: i32) -> Self {
        let now = Utc::now();
        Self {
            file_id: None,
            revision: None,
            submission_id,
            file_stage,
            genre_id: None,
            name: String::new(),
            file_type: String::new(),
            file_size: 0,
            date_uploaded: now,
            date_modified: now,
            assoc_type: None,
            assoc_id: None,
            variant: FileVariant::empty(category),
        }
    }

    /// Composite key, once both parts are assigned.
    pub fn key(&self) -> Option<FileKey> {
        Some(FileKey {
            file_id: self.file_id?,
            revision: self.revision?,
        })
    }

    pub fn category(&self) -> GenreCategory {
        self.variant.category()
    }

    /// Artwork payload, if this file is artwork.
    pub fn artwork(&self) -> Option<&ArtworkMeta> {
        match &self.variant {
            FileVariant::Artwork(meta) => Some(meta),
            FileVariant::Document => None,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        self.artwork().and_then(|a| a.caption.as_deref())
    }

    /// Whether callers may preview this file inline: artwork with an image
    /// MIME type.
    pub fn is_inlineable(&self) -> bool {
        self.category() == GenreCategory::Artwork && self.file_type.starts_with("image/")
    }

    /// Project this file onto another category.
    ///
    /// Fields shared by both variants carry over unchanged; fields exclusive
    /// to the old variant are dropped and fields exclusive to the new one
    /// start out empty. Recasting twice therefore loses artwork metadata
    /// even when the round trip ends on the original category.
    pub fn recast(mut self, category: GenreCategory) -> Self {
        if self.category() != category {
            self.variant = FileVariant::empty(category);
        }
        self
    }
}

impl TryFrom<submission_file::Model> for SubmissionFile {
    type Error = DbErr;

    fn try_from(model: submission_file::Model) -> Result<Self, DbErr> {
        let category: GenreCategory = model.category.parse().map_err(DbErr::Custom)?;
        let variant = match category {
            GenreCategory::Document => FileVariant::Document,
            GenreCategory::Artwork => FileVariant::Artwork(ArtworkMeta {
                caption: model.caption,
                credit: model.credit,
                copyright_owner: model.copyright_owner,
                permission_terms: model.permission_terms,
                original_file_name: model.original_file_name,
            }),
        };

        Ok(Self {
            file_id: Some(model.file_id),
            revision: Some(model.revision),
            submission_id: model.submission_id,
            file_stage: model.file_stage.parse().map_err(DbErr::Custom)?,
            genre_id: Some(model.genre_id),
            name: model.name,
            file_type: model.file_type,
            file_size: model.file_size,
            date_uploaded: model.date_uploaded,
            date_modified: model.date_modified,
            assoc_type: model
                .assoc_type
                .as_deref()
                .map(|t| t.parse().map_err(DbErr::Custom))
                .transpose()?,
            assoc_id: model.assoc_id,
            variant,
        })
    }
}

impl SubmissionFile {
    /// Active model for persisting this file under `key` and `genre_id`.
    ///
    /// The single mapping routine for both variants: artwork columns are
    /// set from the payload or nulled out, depending on the tag.
    pub(crate) fn active_model(&self, key: FileKey, genre_id: i32) -> submission_file::ActiveModel {
        let artwork = self.artwork().cloned().unwrap_or_default();
        submission_file::ActiveModel {
            file_id: Set(key.file_id),
            revision: Set(key.revision),
            submission_id: Set(self.submission_id),
            file_stage: Set(self.file_stage.to_string()),
            genre_id: Set(genre_id),
            category: Set(self.category().to_string()),
            name: Set(self.name.clone()),
            file_type: Set(self.file_type.clone()),
            file_size: Set(self.file_size),
            date_uploaded: Set(self.date_uploaded),
            date_modified: Set(self.date_modified),
            assoc_type: Set(self.assoc_type.map(|t| t.to_string())),
            assoc_id: Set(self.assoc_id),
            caption: Set(artwork.caption),
            credit: Set(artwork.credit),
            copyright_owner: Set(artwork.copyright_owner),
            permission_terms: Set(artwork.permission_terms),
            original_file_name: Set(artwork.original_file_name),
        }
    }
}

/// Offset + count window over a latest-revisions listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub count: usize,
}
