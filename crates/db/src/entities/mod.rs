//! Database entities.

pub mod mass_contact_category;
pub mod mass_contact_message;
pub mod recipient_list_member;
pub mod user;
pub mod user_role;

pub use mass_contact_category::Entity as MassContactCategory;
pub use mass_contact_message::Entity as MassContactMessage;
pub use recipient_list_member::Entity as RecipientListMember;
pub use user::Entity as User;
pub use user_role::Entity as UserRole;
