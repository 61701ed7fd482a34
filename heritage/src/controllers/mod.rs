//! Stateful wrappers around the request client, one per consumer.
//!
//! Each controller owns its state behind a `watch` channel so a view can
//! subscribe to changes. State is never shared between instances and calls
//! are not coalesced here; deduplication happens in the client.

mod mutation;
mod query;
mod upload;

pub use mutation::{DeleteController, MutationController, MutationState};
pub use query::{QueryController, QueryOptions, RequestState, RequestStatus};
pub use upload::{UploadController, UploadState};
