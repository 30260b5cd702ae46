//! WebSocket transport.
//!
//! This module provides the client used for the real-time event stream.

mod client;
pub use client::{WsConnection, WsConnector};
