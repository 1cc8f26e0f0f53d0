use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for posting an activity to the friends feed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostActivityParams {
    /// Free-form activity kind, e.g. "run" or "steps".
    pub kind: String,
    #[serde(default)]
    pub description: String,
}
