pub mod extensions;
pub mod params;

use crate::error::CertKitError;
pub type Result<T> = std::result::Result<T, CertKitError>;
use std::net::IpAddr;

use der::{Decode, Encode};
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, FlagSet,
    KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use params::{DistinguishedName, ExtensionParam, Validity};
use x509_cert::certificate::CertificateInner;

use crate::key::PublicKey;
use crate::pem_utils::{self, CERTIFICATE_LABEL};
use crate::tbs_certificate::from_x509_time;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (RSASSA-PKCS1-v1_5).
    Sha256WithRSA,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA PKCS#1 v1.5 identifiers carry an explicit NULL parameter (RFC 4055).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::AnyRef::NULL.into()),
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

/// The fields of a certificate that this crate sets, decoded back out.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub serial_number: Vec<u8>,
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub validity: Validity,
    pub is_ca: bool,
    pub key_usage: FlagSet<KeyUsages>,
    pub usages: Vec<ExtendedKeyUsageOption>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    pub extensions: Vec<ExtensionParam>,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertKitError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Certificate {
            inner: CertificateInner::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(pem, CERTIFICATE_LABEL)?)
    }

    /// The encoded subject name, usable verbatim as the issuer of a child.
    pub fn subject_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Checks that this certificate was signed by the holder of `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = &self.inner.tbs_certificate;
        if self.inner.signature_algorithm != tbs.signature {
            return Err(CertKitError::VerificationError(
                "outer and inner signature algorithms differ".to_string(),
            ));
        }
        if self.inner.signature_algorithm.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
        {
            return Err(CertKitError::VerificationError(format!(
                "unsupported signature algorithm {}",
                self.inner.signature_algorithm.oid
            )));
        }
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertKitError::DecodingError("signature bit string has unused bits".to_string())
        })?;
        issuer_key.verify(&tbs.to_der()?, signature)
    }

    /// Extracts certificate information into a [`CertificateInfo`].
    pub fn to_cert_info(&self) -> Result<CertificateInfo> {
        let tbs = &self.inner.tbs_certificate;

        let extensions: Vec<ExtensionParam> = tbs
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect();

        let mut info = CertificateInfo {
            serial_number: tbs.serial_number.as_bytes().to_vec(),
            subject: DistinguishedName::from_x509_name(&tbs.subject)?,
            issuer: DistinguishedName::from_x509_name(&tbs.issuer)?,
            validity: Validity {
                not_before: from_x509_time(&tbs.validity.not_before),
                not_after: from_x509_time(&tbs.validity.not_after),
            },
            is_ca: false,
            key_usage: FlagSet::default(),
            usages: Vec::new(),
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            subject_key_id: None,
            authority_key_id: None,
            extensions: Vec::new(),
        };

        for ext in &extensions {
            match ext.oid {
                BasicConstraints::OID => {
                    info.is_ca = ext.to_extension::<BasicConstraints>()?.is_ca;
                }
                KeyUsage::OID => info.key_usage = ext.to_extension::<KeyUsage>()?.0,
                ExtendedKeyUsage::OID => {
                    info.usages = ext.to_extension::<ExtendedKeyUsage>()?.usage;
                }
                SubjectAltName::OID => {
                    let san = ext.to_extension::<SubjectAltName>()?;
                    info.dns_names = san.names;
                    info.ip_addresses = san.ip_addresses;
                }
                SubjectKeyIdentifier::OID => {
                    info.subject_key_id = Some(ext.to_extension::<SubjectKeyIdentifier>()?.0);
                }
                AuthorityKeyIdentifier::OID => {
                    info.authority_key_id = Some(
                        ext.to_extension::<AuthorityKeyIdentifier>()?
                            .key_identifier,
                    );
                }
                _ => {}
            }
        }
        info.extensions = extensions;

        Ok(info)
    }
}
