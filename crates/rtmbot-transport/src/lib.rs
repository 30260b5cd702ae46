//! # rtmbot Transport
//!
//! Network implementations of the seams defined in `rtmbot-core`.
//!
//! ## Features
//!
//! - `ws-client` (default): [`WsConnector`], the persistent event stream
//! - `http-client` (default): [`HttpApiCaller`], remote method calls
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  rtmbot-runtime     │  (connection manager)
//! ├─────────────────────┤
//! │  rtmbot-core        │  (Connector / ApiCaller traits)
//! ├─────────────────────┤
//! │  rtmbot-transport   │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rtmbot_transport::{HttpApiCaller, WsConnector};
//!
//! let api = HttpApiCaller::new("xoxb-token")?;
//! let start = api.call("rtm.start", Params::new()).await?;
//!
//! let mut connection = WsConnector::new().connect(start["url"].as_str().unwrap()).await?;
//! while let Some(frame) = connection.next_frame().await {
//!     // ...
//! }
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

#[cfg(feature = "http-client")]
pub use http::HttpApiCaller;

#[cfg(feature = "ws-client")]
pub use websocket::{WsConnection, WsConnector};
