mod store;

pub use store::{ApiErrorBody, ApiErrorObject, StoreError, StoreResult};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
