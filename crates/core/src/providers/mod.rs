//! Built-in recipient providers.

mod list;
mod role;

pub use list::ListProvider;
pub use role::RoleProvider;
