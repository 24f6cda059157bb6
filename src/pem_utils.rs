use der::Decode;
use x509_cert::certificate::CertificateInner;

use crate::error::CertKitError;
use crate::key::KeyPair;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// Lines are wrapped at 64 columns and terminated with `\n`.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, checking the block label.
pub fn pem_to_der(pem_str: &str, expected_label: &str) -> Result<Vec<u8>, CertKitError> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != expected_label {
        return Err(CertKitError::DecodingError(format!(
            "expected PEM block `{expected_label}`, found `{}`",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

/// Checks that a PEM certificate and a PEM PKCS#1 key load together as a TLS key pair.
///
/// The certificate must decode as X.509, the key must be a consistent RSA
/// private key, and the certificate's public key must be the key's public half.
pub fn verify_key_pair(cert_pem: &str, key_pem: &str) -> Result<(), CertKitError> {
    let cert_der = pem_to_der(cert_pem, CERTIFICATE_LABEL)
        .map_err(|e| CertKitError::VerificationError(e.to_string()))?;
    let cert: CertificateInner = CertificateInner::from_der(&cert_der)
        .map_err(|e| CertKitError::VerificationError(format!("certificate: {e}")))?;

    let key = KeyPair::import_from_pkcs1_pem(key_pem)
        .map_err(|e| CertKitError::VerificationError(format!("private key: {e}")))?;

    let spki = &cert.tbs_certificate.subject_public_key_info;
    let cert_public = crate::key::PublicKey::from_x509spki(spki)
        .map_err(|e| CertKitError::VerificationError(format!("certificate public key: {e}")))?;

    if cert_public != key.public_key() {
        return Err(CertKitError::VerificationError(
            "private key does not match certificate public key".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_lines_are_wrapped_with_lf() {
        let pem = der_to_pem(&[0xAB; 100], CERTIFICATE_LABEL);
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.ends_with("-----END CERTIFICATE-----\n"));
        assert!(!pem.contains('\r'));
        assert!(pem.lines().all(|line| line.len() <= 64));
    }

    #[test]
    fn pem_to_der_rejects_unexpected_label() {
        let pem = der_to_pem(&[1, 2, 3], RSA_PRIVATE_KEY_LABEL);
        assert_eq!(pem_to_der(&pem, RSA_PRIVATE_KEY_LABEL).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            pem_to_der(&pem, CERTIFICATE_LABEL),
            Err(CertKitError::DecodingError(_))
        ));
    }

    #[test]
    fn garbage_certificate_fails_verification() {
        let key = KeyPair::generate().unwrap();
        let cert_pem = der_to_pem(b"not a certificate", CERTIFICATE_LABEL);
        let err = verify_key_pair(&cert_pem, &key.to_pkcs1_pem().unwrap()).unwrap_err();
        assert!(matches!(err, CertKitError::VerificationError(_)));
    }
}
