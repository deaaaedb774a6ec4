//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Value of `mass_contact_opt_out` meaning "not opted out".
pub const OPT_OUT_NONE: &str = "0";

/// Value of `mass_contact_opt_out` meaning "opted out of everything".
pub const OPT_OUT_ALL: &str = "1";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    /// Preferred language code
    pub language: String,

    /// Blocked or deactivated accounts never receive mail
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// NULL or "0" = subscribed, "1" = opted out of everything,
    /// any other value = id of the category opted out of
    #[sea_orm(nullable)]
    pub mass_contact_opt_out: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRole,
    #[sea_orm(has_many = "super::recipient_list_member::Entity")]
    RecipientListMember,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRole.def()
    }
}

impl Related<super::recipient_list_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipientListMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
