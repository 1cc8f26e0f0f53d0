use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use events::RecipientId;
use log::*;
use service::AppState;

/// The authenticated caller's user id, extracted from the
/// `Authorization: Bearer` header. Rejects with 401 before any handler code
/// runs when the token is missing, malformed, or expired.
pub(crate) struct AuthenticatedUser(pub RecipientId);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(unauthorized)?;
        let token = bearer_token(header).ok_or_else(unauthorized)?;

        match domain::jwt::validate_token(state.config.jwt_secret(), token) {
            Ok(claims) => Ok(AuthenticatedUser(claims.sub)),
            Err(e) => {
                debug!("rejecting request with invalid access token: {e}");
                Err(unauthorized())
            }
        }
    }
}

fn unauthorized() -> RejectionType {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

/// Strips the `Bearer ` scheme prefix from an Authorization header value.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_bearer_scheme() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_scheme_and_empty_tokens() {
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
    }
}
