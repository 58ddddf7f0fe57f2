//! Participant identity on the wire.
//!
//! `X-User-Id` is set by an upstream authenticator. Guests send their opaque
//! token as `X-Guest-Token` or, where headers are awkward (EventSource), as
//! the `guestToken` query parameter.

use agora_types::ParticipantIdentity;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const GUEST_TOKEN_HEADER: &str = "x-guest-token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityQuery {
    guest_token: Option<String>,
}

/// Resolved participant; rejects the request with 401 when none is present
#[derive(Debug, Clone)]
pub struct Participant(pub ParticipantIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Participant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER);
        let guest_token = header_value(parts, GUEST_TOKEN_HEADER).or_else(|| {
            Query::<IdentityQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(query)| query.guest_token)
        });

        ParticipantIdentity::resolve(user_id.as_deref(), guest_token.as_deref())
            .map(Participant)
            .ok_or(ApiError::Unauthorized)
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
