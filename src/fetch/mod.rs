//! Record retrieval from the profile service.

pub mod paginator;

pub use paginator::{FetchConfig, FetchError, FetchOutcome, Fetcher, StopReason};
