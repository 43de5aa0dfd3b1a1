//! Identity gate for the library lending system.
//!
//! Every authenticated operation starts here: an inbound bearer header is
//! verified once and exchanged for an [`Identity`], which downstream layers
//! require by type. There is no per-field authorization beyond this gate.

pub mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Identity, IdentityGate, TOKEN_TTL};
