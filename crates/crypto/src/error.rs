//! Errors raised by the primitive layer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Malformed field element: {0}")]
    MalformedFieldElement(String),
    #[error("Point is not on the curve or outside the prime-order subgroup")]
    InvalidPoint,
    #[error("Malformed private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Decryption failed")]
    DecryptionFailure,
    #[error("Signature verification failed")]
    SignatureInvalid,
}
