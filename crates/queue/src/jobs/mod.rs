//! Job definitions.

#![allow(missing_docs)]

mod resolve;
mod send;

pub use resolve::ResolveMessageJob;
pub use send::SendBatchJob;
