//! Pipeline services.

pub mod batch;
pub mod dispatcher;
pub mod email;
pub mod mass_contact;
pub mod opt_out;
pub mod resolver;

pub use batch::{MAX_QUEUE_RECIPIENTS, partition};
pub use dispatcher::{DispatchReport, MessageDispatcher};
pub use email::SmtpMailTransport;
pub use mass_contact::{
    ArchiveOutcome, MassContactService, NO_RECIPIENTS, SubmissionOutcome, SubmissionReport,
    SubmitRequest,
};
pub use opt_out::OptOutFilter;
pub use resolver::{ProviderRegistry, RecipientResolver};
