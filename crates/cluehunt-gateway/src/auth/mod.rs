//! Authentication module for the Cluehunt gateway.
//!
//! The surrounding platform signs bearer tokens for logged-in players; the
//! gateway only validates them to learn who is connecting.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::TokenManager;
