//! HS256 bearer-token verification and issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Default lifetime of an issued token.
pub const TOKEN_TTL: Duration = Duration::hours(24);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// The verified caller of an operation.
///
/// An `Identity` can only be obtained from [`IdentityGate::verify`], so any
/// function taking one is statically guaranteed to run behind the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
}

impl Identity {
    /// The caller's username as carried in the token.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// Verifies inbound bearer headers and issues signed tokens.
///
/// Pure verification: no storage, no side effects. One gate instance is
/// shared by all domains in the process.
#[derive(Clone)]
pub struct IdentityGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl IdentityGate {
    /// Creates a gate from a shared HS256 secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Validates an `Authorization` header value and extracts the caller.
    pub fn verify(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        if header.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let token = match header.split_once(' ') {
            Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => token,
            _ => return Err(AuthError::MalformedHeader),
        };

        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            },
        )?;

        Ok(Identity {
            username: data.claims.sub,
        })
    }

    /// Signs a token for `username`, valid for `ttl`.
    pub fn issue(&self, username: &str, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AuthError::Signing
        })
    }
}

impl std::fmt::Debug for IdentityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> IdentityGate {
        IdentityGate::new(b"test-secret")
    }

    #[test]
    fn issued_token_verifies() {
        let gate = gate();
        let token = gate.issue("alice", TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.username(), "alice");
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_eq!(gate().verify(None), Err(AuthError::MissingToken));
        assert_eq!(gate().verify(Some("")), Err(AuthError::MissingToken));
    }

    #[test]
    fn non_bearer_prefix_is_rejected() {
        let gate = gate();
        let token = gate.issue("alice", TOKEN_TTL).unwrap();
        assert_eq!(
            gate.verify(Some(&format!("Basic {token}"))),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(gate.verify(Some("Bearer")), Err(AuthError::MalformedHeader));
        assert_eq!(
            gate.verify(Some("Bearer a b")),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = IdentityGate::new(b"other-secret");
        let token = other.issue("mallory", TOKEN_TTL).unwrap();
        assert_eq!(
            gate().verify(Some(&format!("Bearer {token}"))),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let gate = gate();
        let token = gate.issue("alice", Duration::hours(-1)).unwrap();
        assert_eq!(
            gate.verify(Some(&format!("Bearer {token}"))),
            Err(AuthError::InvalidToken)
        );
    }
}
