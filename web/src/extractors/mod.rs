use axum::http::StatusCode;

pub(crate) mod authenticated_user;

pub(crate) type RejectionType = (StatusCode, String);
