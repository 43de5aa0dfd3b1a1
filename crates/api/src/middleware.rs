//! Bearer-token middleware feeding the identity gate.

use axum::Extension;
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use auth::{Identity, IdentityGate};

use crate::error::ApiError;

/// Verifies the `Authorization` header and stashes the resulting
/// [`Identity`] in request extensions for the handlers.
pub async fn require_identity(
    Extension(gate): Extension<IdentityGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity: Identity = gate.verify(header)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
