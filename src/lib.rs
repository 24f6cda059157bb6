//! # testssl - local CA and server certificates for TLS development
//!
//! testssl generates a self-signed root certificate authority and a server
//! certificate signed by it, built entirely with rustcrypto libraries. The
//! four PEM files it produces (`rootCA.pem`, `rootCA.key`, `server.pem`,
//! `server.key`) are meant for local testing of TLS services only.
//!
//! ## What gets issued
//!
//! - **Root CA**: RSA-2048, self-signed, `CA=true`, key usage
//!   digitalSignature + keyCertSign, valid for ten years.
//! - **Server**: RSA-2048, signed by the root, SANs `<host>`, `*.<host>`,
//!   `127.0.0.1` and `::1`, valid for ten years.
//!
//! Both subjects share the organizational fields of [`SubjectConfig`] and an
//! `emailAddress` of `example@<host>`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use testssl::{SubjectConfig, generate_certificates};
//!
//! # fn main() -> Result<(), testssl::error::CertKitError> {
//! let generated = generate_certificates("example", &SubjectConfig::default())?;
//! assert_eq!(generated.hostname, "example.test");
//! generated.write_to_dir("ssl")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing step by step
//!
//! ```rust,no_run
//! use testssl::{SubjectConfig, domain, issuer::{issue_leaf, issue_root}};
//!
//! # fn main() -> Result<(), testssl::error::CertKitError> {
//! let hostname = domain::normalize("https://www.example.com")?;
//! let config = SubjectConfig::builder().organization("Acme Dev").build();
//!
//! let root = issue_root(&hostname, &config)?;
//! let server = issue_leaf(&hostname, &config, &root)?;
//! println!("{}", server.cert_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`domain`]: hostname normalization
//! - [`serial`]: domain-derived serial numbers
//! - [`key`]: RSA key generation, PKCS#1 export and signing
//! - [`cert`]: certificate templates, names, extensions and decoding
//! - [`issuer`]: root and server certificate issuance
//! - [`pem_utils`]: PEM encoding and key pair verification
//! - [`generate`]: the end-to-end entry point and file output
//! - [`error`]: error types

pub mod cert;
pub mod domain;
pub mod error;
pub mod generate;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod serial;
pub mod tbs_certificate;

pub use cert::params::SubjectConfig;
pub use generate::{GeneratedCertificates, generate_certificates};
