//! use testssl::error::CertKitError;

use thiserror::Error;

/// Represents errors that can occur while generating local certificates.
///
/// Every variant is terminal for a generation run; nothing here is retried.
#[derive(Debug, Error)]
pub enum CertKitError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input, such as an empty or overlong domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// A signed certificate and its key do not form a usable TLS key pair.
    #[error("Verification error: {0}")]
    VerificationError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error from RSA PKCS1 operations.
    #[error("RSA PKCS1 error: {0}")]
    RsaPkcs1Error(String),

    /// Error while writing generated files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<der::Error> for CertKitError {
    /// Converts a `der::Error` into a `CertKitError`.
    fn from(err: der::Error) -> Self {
        CertKitError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertKitError {
    fn from(err: rsa::Error) -> Self {
        CertKitError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertKitError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertKitError::RsaPkcs1Error(err.to_string())
    }
}

impl From<pem::PemError> for CertKitError {
    fn from(err: pem::PemError) -> Self {
        CertKitError::DecodingError(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for CertKitError {
    fn from(err: x509_cert::spki::Error) -> Self {
        CertKitError::EncodingError(err.to_string())
    }
}
