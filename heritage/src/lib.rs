//! Resilient data access for the heritage registry console: one client that
//! deduplicates, caches, retries and normalizes, and the controllers views
//! drive it through.

pub mod cache;
pub mod client;
pub mod controllers;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod notify;
pub mod policy;
pub mod ports;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{RequestClient, RequestClientBuilder};
pub use controllers::{
    DeleteController, MutationController, MutationState, QueryController, QueryOptions,
    RequestState, RequestStatus, UploadController, UploadState,
};
pub use credentials::{FileCredentialStore, MemoryCredentialStore};
pub use domain::{Method, ProgressCallback, RequestConfig, TransferProgress, UploadFile};
pub use error::{ApiError, Result, TransportError};
pub use notify::{Notification, Severity, TracingNotifier};
pub use policy::{EndpointPolicy, EndpointRule, PolicyTable, PublicScope};
pub use retry::{RetryPolicy, retry};
pub use transport::ReqwestTransport;
