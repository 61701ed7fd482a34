pub mod api;
pub mod normalize;

pub use api::{FailureKind, FieldError, NormalizedError, NormalizedPage, QueryParams};
pub use normalize::{looks_paginated, normalize_error, normalize_page};
