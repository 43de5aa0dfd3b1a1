use thiserror::Error;

/// Failures produced by the identity gate.
///
/// All variants are terminal for the request and map to `Unauthenticated`
/// at the domain boundary; none carry token material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header was supplied.
    #[error("authorization token missing")]
    MissingToken,

    /// The header was present but not of the form `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// The token failed signature or expiry validation.
    #[error("invalid token")]
    InvalidToken,

    /// Signing a new token failed.
    #[error("failed to sign token")]
    Signing,
}
