//! Mass contact category entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named group of recipients a message can be addressed to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mass_contact_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human readable label.
    pub label: String,

    /// Whether the category is pre-selected on the compose form.
    #[sea_orm(default_value = false)]
    pub selected: bool,

    /// Permission a sender needs to address this category.
    pub permission_scope: String,

    /// Ordered provider bindings:
    /// `[{"provider": "role", "categories": ["editor"]}, ...]`
    #[sea_orm(column_type = "JsonBinary")]
    pub recipients: Json,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
