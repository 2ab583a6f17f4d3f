use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pins one file revision to a review round.
///
/// At most one assignment per (file, stage, round); re-assigning replaces
/// the pinned revision.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review_round_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: i32,

    /// String value of [`crate::stage::WorkflowStage`].
    #[sea_orm(primary_key, auto_increment = false)]
    pub stage_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub round: i32,

    pub revision: i32,

    #[sea_orm(indexed)]
    pub submission_id: i32,
}

impl ActiveModelBehavior for ActiveModel {}
