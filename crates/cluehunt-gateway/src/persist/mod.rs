//! Fire-and-forget chat message persistence.

mod writer;

pub use writer::{MessageWriter, WriteRequest};
