//! Room group registry for WebSocket fan-out.

mod group;

pub use group::GroupRegistry;
