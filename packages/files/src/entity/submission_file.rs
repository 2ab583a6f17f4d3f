use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One revision of a submission file.
///
/// Document and artwork variants share this table; `category` is the
/// variant tag and the artwork-only columns are null for document rows.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub revision: i32,

    #[sea_orm(indexed)]
    pub submission_id: i32,

    /// String value of [`crate::stage::FileStage`].
    pub file_stage: String,

    pub genre_id: i32,

    /// Variant tag; string value of [`crate::genre::GenreCategory`].
    pub category: String,

    pub name: String,

    /// MIME content type.
    pub file_type: String,

    pub file_size: i64,

    pub date_uploaded: DateTimeUtc,

    pub date_modified: DateTimeUtc,

    /// Owning entity type; string value of [`crate::stage::AssocType`].
    #[sea_orm(indexed)]
    pub assoc_type: Option<String>,

    #[sea_orm(indexed)]
    pub assoc_id: Option<i32>,

    pub caption: Option<String>,

    pub credit: Option<String>,

    pub copyright_owner: Option<String>,

    pub permission_terms: Option<String>,

    pub original_file_name: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
