//! Integration layer - External system interfaces.
//!
//! This module contains the seams towards the outside world:
//! - Remote method calls ([`ApiCaller`])
//! - The persistent connection ([`Connector`], [`Connection`])
//! - The session shared with handlers ([`Session`], [`Identity`])

pub mod api;
pub mod session;
pub mod transport;

pub use api::{ApiCaller, BoxedApiCaller, DisabledApiCaller, Params, ensure_ok, params};
pub use session::{Identity, Session};
pub use transport::{
    BoxedConnection, BoxedConnector, Connection, Connector, Frame, MessageSink,
};
