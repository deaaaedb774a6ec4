//! Database-backed implementations of the collaborator traits.

mod archive;
mod category;
mod directory;

pub use archive::DbArchiveStore;
pub use category::DbCategoryStore;
pub use directory::DbRecipientDirectory;
