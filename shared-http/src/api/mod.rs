mod failure;
mod messages;
mod requests;
mod responses;

pub use failure::FailureKind;
pub use messages::{reason_phrase, status_message, user_message};
pub use requests::QueryParams;
pub use responses::{FieldError, NormalizedError, NormalizedPage};
