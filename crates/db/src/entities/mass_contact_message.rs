//! Archived mass contact message entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Archived copy of a sent message.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mass_contact_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Body format machine name (`plain_text`, `html`).
    pub format: String,

    /// Category ids the message was addressed to.
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: Json,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
