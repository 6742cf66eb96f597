pub mod jwt;
pub mod verifier;

pub use jwt::JwtIdentityVerifier;
pub use verifier::{IdentityVerifier, VerifierError};
