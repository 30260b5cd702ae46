//! HTTP transport.
//!
//! This module provides the client used for remote method calls.

mod client;
pub use client::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT, HttpApiCaller};
