//! JWT claims structure for Divert sessions.

use serde::{Deserialize, Serialize};

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID; doubles as the session row ID.
    pub jti: String,
    /// Subject (account ID).
    pub sub: String,
    /// Account name at issue time.
    pub name: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The account ID carried in `sub`, if well-formed.
    pub fn account_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}
