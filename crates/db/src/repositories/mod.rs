//! Repositories for database access.

mod category;
mod message;
mod user;

pub use category::CategoryRepository;
pub use message::MessageRepository;
pub use user::UserRepository;
