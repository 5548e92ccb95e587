//! JWT claims carried by Cluehunt bearer tokens.

use serde::{Deserialize, Serialize};

/// Claims embedded in a player's bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (player account ID).
    pub sub: String,
    /// Login name; room authorization is keyed on this.
    pub username: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}
