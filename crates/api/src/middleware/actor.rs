//! Actor extraction for audited requests.
//!
//! Every mutation is recorded under the name sent in the `X-Actor` header.
//! Reads may omit it.

use axum::{
    extract::{FromRequestParts, Request},
    http::{Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tally_shared::AppError;

use crate::error::ApiError;

/// Header naming the acting user.
pub const ACTOR_HEADER: &str = "x-actor";

/// The acting user of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    /// Returns the actor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

fn missing_actor() -> ApiError {
    ApiError::App(AppError::Unauthorized(format!(
        "the {ACTOR_HEADER} header is required for changes"
    )))
}

/// Reads `X-Actor` into request extensions.
///
/// Requests other than GET and HEAD are rejected with 401 when the header
/// is missing or blank.
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    match actor {
        Some(name) => {
            request.extensions_mut().insert(Actor(name));
            next.run(request).await
        }
        None if matches!(*request.method(), Method::GET | Method::HEAD) => {
            next.run(request).await
        }
        None => missing_actor().into_response(),
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or_else(missing_actor)
    }
}
