use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use der::Encode;
use sha1::Sha1;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::extensions::BasicConstraints;
use crate::cert::extensions::ExtendedKeyUsage;
use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::extensions::KeyUsage;
use crate::cert::extensions::KeyUsages;
use crate::cert::extensions::SubjectAltName;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::{
    CertificateTemplate, DistinguishedName, ExtensionParam, SubjectConfig, Validity,
};
use crate::error::CertKitError;
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils;
use crate::serial::{derive_serial, to_serial_bytes};
use crate::tbs_certificate::TbsCertificate;

type Result<T> = std::result::Result<T, CertKitError>;

/// Lifetime of both generated certificates.
pub const VALIDITY_YEARS: i32 = 10;

/// Subject key identifier placed in every leaf certificate.
pub const LEAF_SUBJECT_KEY_ID: [u8; 5] = [1, 2, 3, 4, 6];

/// Loopback addresses added to the leaf for local testing.
pub const LOOPBACK_ADDRESSES: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::LOCALHOST),
    IpAddr::V6(Ipv6Addr::LOCALHOST),
];

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the encoded name placed in the `issuer` field of issued certificates.
    fn issuer_name(&self) -> Result<x509_cert::name::Name>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the key identifier copied into the Authority Key Identifier
    /// extension, if the issuer has one.
    fn key_identifier(&self) -> Option<Vec<u8>>;

    /// Builds the certificate described by `template` and signs it with
    /// [`Issuer::signing_key`].
    ///
    /// Extensions are emitted in the order key usage, extended key usage,
    /// basic constraints, subject key identifier, authority key identifier,
    /// subject alternative name.
    fn issue(&self, template: &CertificateTemplate) -> Result<Certificate> {
        let signature_algo = SignatureAlgorithm::Sha256WithRSA;
        let subject_public_key_info = template.subject_public_key.to_spki()?;

        let mut extensions: Vec<ExtensionParam> = Vec::new();

        if !template.key_usage.is_empty() {
            extensions.push(ExtensionParam::from_extension(
                KeyUsage(template.key_usage),
                true,
            )?);
        }

        if !template.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: template.usages.clone(),
            };
            extensions.push(ExtensionParam::from_extension(extended_key_usage, false)?);
        }

        if template.is_ca {
            let basic_constraints = BasicConstraints { is_ca: true };
            extensions.push(ExtensionParam::from_extension(basic_constraints, true)?);
        }

        let subject_key_id = match &template.subject_key_id {
            Some(id) => Some(id.clone()),
            None if template.is_ca => Some(public_key_identifier(&template.subject_public_key)?),
            None => None,
        };
        if let Some(id) = subject_key_id {
            extensions.push(ExtensionParam::from_extension(
                SubjectKeyIdentifier(id),
                false,
            )?);
        }

        if let Some(key_identifier) = self.key_identifier() {
            extensions.push(ExtensionParam::from_extension(
                AuthorityKeyIdentifier { key_identifier },
                false,
            )?);
        }

        if !template.dns_names.is_empty() || !template.ip_addresses.is_empty() {
            let san = SubjectAltName {
                names: template.dns_names.clone(),
                ip_addresses: template.ip_addresses.clone(),
            };
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }

        let tbs_cert = TbsCertificate {
            serial_number: to_serial_bytes(template.serial_number),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name()?,
            not_before: template.validity.not_before,
            not_after: template.validity.not_after,
            subject: template.subject.as_x509_name()?,
            subject_public_key_info,
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// SHA-1 of the subjectPublicKey bits (RFC 5280 4.2.1.2, method 1).
pub fn public_key_identifier(public_key: &PublicKey) -> Result<Vec<u8>> {
    let spki = public_key.to_spki()?;
    let key_id = <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());
    Ok(key_id.to_vec())
}

// Issuer for self-signed certificates: issuer name = subject, no AKI.
struct SelfIssuer<'a> {
    name: x509_cert::name::Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<x509_cert::name::Name> {
        Ok(self.name.clone())
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn key_identifier(&self) -> Option<Vec<u8>> {
        None
    }
}

impl Certificate {
    /// Creates a new self-signed certificate: issuer = subject, signed with `key`.
    pub fn new_self_signed(template: &CertificateTemplate, key: &KeyPair) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: template.subject.as_x509_name()?,
            key,
        };
        self_issuer.issue(template)
    }
}

/// A signed certificate together with its private key and PEM renderings.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub der: Vec<u8>,
    pub cert: Certificate,
    pub key: KeyPair,
    pub cert_pem: String,
    pub key_pem: String,
    /// Subject key identifier of `cert`, copied into children as their AKI.
    pub subject_key_id: Option<Vec<u8>>,
}

impl IssuedCertificate {
    /// Encodes `cert` and `key` and checks that the PEM pair loads as a TLS key pair.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        let der = cert.to_der()?;
        let cert_pem = pem_utils::der_to_pem(&der, pem_utils::CERTIFICATE_LABEL);
        let key_pem = key.to_pkcs1_pem()?;
        pem_utils::verify_key_pair(&cert_pem, &key_pem)?;
        let subject_key_id = cert.to_cert_info()?.subject_key_id;
        Ok(Self {
            der,
            cert,
            key,
            cert_pem,
            key_pem,
            subject_key_id,
        })
    }
}

impl Issuer for IssuedCertificate {
    fn issuer_name(&self) -> Result<x509_cert::name::Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.cert.subject_name().clone())
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn key_identifier(&self) -> Option<Vec<u8>> {
        self.subject_key_id.clone()
    }
}

/// Issues the self-signed root CA for `hostname`.
///
/// CA=true, key usage {digitalSignature, keyCertSign}, extended key usage
/// {clientAuth, serverAuth}, valid for [`VALIDITY_YEARS`] from now.
pub fn issue_root(hostname: &str, config: &SubjectConfig) -> Result<IssuedCertificate> {
    let key = KeyPair::generate()?;
    let template = CertificateTemplate::builder()
        .serial_number(derive_serial(hostname))
        .subject(DistinguishedName::for_host(hostname, config))
        .subject_public_key(key.public_key())
        .validity(Validity::for_years(VALIDITY_YEARS))
        .is_ca(true)
        .key_usage(KeyUsages::DigitalSignature | KeyUsages::KeyCertSign)
        .usages(vec![
            ExtendedKeyUsageOption::ClientAuth,
            ExtendedKeyUsageOption::ServerAuth,
        ])
        .build();

    let cert = Certificate::new_self_signed(&template, &key)?;
    let issued = IssuedCertificate::new(cert, key)?;
    tracing::info!(
        hostname,
        serial = template.serial_number,
        "issued root CA certificate"
    );
    Ok(issued)
}

/// Issues the server certificate for `hostname`, signed by `ca`.
///
/// Not a CA. Subject alternative names are `hostname`, `*.hostname`,
/// 127.0.0.1 and ::1.
pub fn issue_leaf(
    hostname: &str,
    config: &SubjectConfig,
    ca: &IssuedCertificate,
) -> Result<IssuedCertificate> {
    let key = KeyPair::generate()?;
    let template = CertificateTemplate::builder()
        .serial_number(derive_serial(hostname))
        .subject(DistinguishedName::for_host(hostname, config))
        .subject_public_key(key.public_key())
        .validity(Validity::for_years(VALIDITY_YEARS))
        .key_usage(KeyUsages::DigitalSignature.into())
        .usages(vec![
            ExtendedKeyUsageOption::ClientAuth,
            ExtendedKeyUsageOption::ServerAuth,
        ])
        .dns_names(vec![hostname.to_string(), format!("*.{hostname}")])
        .ip_addresses(LOOPBACK_ADDRESSES.to_vec())
        .subject_key_id(LEAF_SUBJECT_KEY_ID.to_vec())
        .build();

    let cert = ca.issue(&template)?;
    let issued = IssuedCertificate::new(cert, key)?;
    tracing::info!(
        hostname,
        serial = template.serial_number,
        "issued server certificate"
    );
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{FlagSet, ToAndFromX509Extension};

    fn root() -> IssuedCertificate {
        issue_root("example.test", &SubjectConfig::default()).unwrap()
    }

    #[test]
    fn test_root_is_self_signed_ca() {
        let root = root();
        let info = root.cert.to_cert_info().unwrap();

        assert!(info.is_ca);
        assert_eq!(root.cert.issuer_name(), root.cert.subject_name());
        assert_eq!(
            info.key_usage,
            KeyUsages::DigitalSignature | KeyUsages::KeyCertSign
        );
        assert_eq!(
            info.usages,
            vec![
                ExtendedKeyUsageOption::ClientAuth,
                ExtendedKeyUsageOption::ServerAuth
            ]
        );
        assert_eq!(
            info.subject_key_id,
            Some(public_key_identifier(&root.key.public_key()).unwrap())
        );
        assert_eq!(info.authority_key_id, None);
        assert!(info.dns_names.is_empty());
        root.cert.verify_signed_by(&root.key.public_key()).unwrap();
    }

    #[test]
    fn test_leaf_is_signed_by_root() {
        let root = root();
        let leaf = issue_leaf("example.test", &SubjectConfig::default(), &root).unwrap();
        let info = leaf.cert.to_cert_info().unwrap();

        assert!(!info.is_ca);
        assert_eq!(leaf.cert.issuer_name(), root.cert.subject_name());
        assert_eq!(info.key_usage, FlagSet::from(KeyUsages::DigitalSignature));
        assert_eq!(info.subject_key_id, Some(LEAF_SUBJECT_KEY_ID.to_vec()));
        assert_eq!(
            info.authority_key_id,
            root.cert.to_cert_info().unwrap().subject_key_id
        );
        assert_eq!(info.dns_names, vec!["example.test", "*.example.test"]);
        assert_eq!(info.ip_addresses, LOOPBACK_ADDRESSES.to_vec());

        leaf.cert.verify_signed_by(&root.key.public_key()).unwrap();
        assert!(leaf.cert.verify_signed_by(&leaf.key.public_key()).is_err());
        assert_ne!(leaf.key.public_key(), root.key.public_key());
    }

    #[test]
    fn test_leaf_has_no_basic_constraints() {
        let root = root();
        let leaf = issue_leaf("example.test", &SubjectConfig::default(), &root).unwrap();
        let info = leaf.cert.to_cert_info().unwrap();
        assert!(
            info.extensions
                .iter()
                .all(|ext| ext.oid != BasicConstraints::OID)
        );
    }

    #[test]
    fn test_validity_is_ten_years() {
        let info = root().cert.to_cert_info().unwrap();
        let years = info.validity.not_after.year() - info.validity.not_before.year();
        assert_eq!(years, VALIDITY_YEARS);
    }

    #[test]
    fn test_issued_certificate_keeps_subject_key_id() {
        let root = root();
        assert_eq!(
            root.subject_key_id,
            Some(public_key_identifier(&root.key.public_key()).unwrap())
        );
        assert_eq!(root.key_identifier(), root.subject_key_id);
    }

    #[test]
    fn test_mismatched_key_fails_verification() {
        let root = root();
        let other = KeyPair::generate().unwrap();
        assert!(matches!(
            IssuedCertificate::new(root.cert.clone(), other),
            Err(CertKitError::VerificationError(_))
        ));
    }
}
