//! Claims embedded in platform access tokens.

use serde::{Deserialize, Serialize};

/// Standard claims carried by every access token.
///
/// `sub` is the user id; downstream it becomes the recipient address the
/// realtime hub fans events out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}
