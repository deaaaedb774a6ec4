//! Common utilities and shared types for masscontact-rs.
//!
//! This crate provides foundational components used across all masscontact-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use masscontact_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("Batch size {} for message {}", config.mass_contact.batch_size, id_gen.generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{
    Config, DatabaseConfig, MassContactSettings, OptOutMode, QueueSettings, RedisConfig,
    SmtpConfig,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
