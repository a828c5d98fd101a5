//! HTTP client for the locflow translation service.
//!
//! This crate provides:
//! - A pre-configured reqwest client with a consistent User-Agent and
//!   request timeout
//! - Typed request/response methods for the upload, setup, enqueue, status
//!   and batch-download endpoints
//! - Bounded retry with exponential backoff for transient failures

mod client;
mod error;
mod retry;

pub use client::{ApiClient, ClientOptions, user_agent};
pub use error::ApiError;
pub use retry::{with_retries, RetryConfig, RetryableError};
