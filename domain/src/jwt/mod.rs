//! Access token issuing and validation for the authentication boundary.
//!
//! Both transports consume this: the web layer reads `Authorization: Bearer`
//! headers (or a `?token=` query parameter on websocket upgrades), the rpc
//! layer reads `authorization` call metadata. The validated `sub` claim is
//! the user id the hub uses as the recipient address; nothing past the
//! boundary ever sees a raw token.

use crate::error::Error;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

pub use claims::AuthClaims;

pub(crate) mod claims;

/// Issue an HMAC-SHA256 access token for `user_id`, valid for
/// `ttl_seconds` from now.
pub fn generate_token(secret: &str, user_id: &str, ttl_seconds: i64) -> Result<String, Error> {
    let now = Utc::now();
    let claims = AuthClaims {
        sub: user_id.to_owned(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ttl_seconds)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate a token's signature and expiry and return its claims.
pub fn validate_token(secret: &str, token: &str) -> Result<AuthClaims, Error> {
    let data = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
