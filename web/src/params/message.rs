use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for sending a chat message.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageParams {
    /// User id of the receiver.
    pub receiver_id: String,
    pub text: String,
}
