//! Job workers.

mod resolve;
mod runner;
mod send;

pub use resolve::{ResolveContext, ResolveSummary, resolve_message_worker};
pub use runner::{Processed, WorkerError, drain, process_next, run_worker};
pub use send::{SendContext, send_batch_worker};
