//! WebSocket server surface for the Cluehunt gateway.

pub mod chat;


pub use chat::{AppState, router};
