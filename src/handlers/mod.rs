//! HTTP and WebSocket request handlers.

pub mod http;
pub mod visitors;
pub mod ws;

pub use http::*;
pub use visitors::*;
pub use ws::*;
