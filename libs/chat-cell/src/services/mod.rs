pub mod chat;
pub mod presence;

pub use chat::ChatService;
pub use presence::{ConnectionHandle, PresenceRegistry};
