//! Data models for presence, gateway frames, scrobbles, and visitors.

pub mod frame;
pub mod presence;
pub mod scrobble;
pub mod visitor;

pub use frame::*;
pub use presence::*;
pub use scrobble::*;
pub use visitor::*;
