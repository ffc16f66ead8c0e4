//! Business logic: presence engine facade and upstream API clients.

pub mod presence;
pub mod scrobble;
pub mod search;
pub mod visitor;

pub use presence::PresenceService;
pub use scrobble::ScrobbleService;
pub use search::MusicSearchService;
pub use visitor::VisitorService;
