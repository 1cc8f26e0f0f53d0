use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for creating a challenge.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChallengeParams {
    pub name: String,
}
