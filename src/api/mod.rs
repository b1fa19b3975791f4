//! Read-only query surface over the operation store.
//!
//! Transport is left to the embedding application; these functions take raw
//! request parameters and return serializable results.

pub mod error;
pub mod query;

pub use error::ApiError;
pub use query::{get_operations, get_tracked_accounts, TrackedAccounts};
