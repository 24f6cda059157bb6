use crate::error::CertKitError;
use der::asn1::OctetString;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian bytes of the certificate serial number.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The encoded issuer name, taken verbatim from the issuing certificate's subject.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The encoded subject name.
/// * `subject_public_key_info` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: x509_cert::name::Name,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject: x509_cert::name::Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, CertKitError> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>, CertKitError>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| CertKitError::EncodingError(format!("serial number: {e}")))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

/// UTCTime through 2049, GeneralizedTime from 2050 on (RFC 5280 4.1.2.5).
pub(crate) fn to_x509_time(at: time::OffsetDateTime) -> Result<x509_cert::time::Time, CertKitError> {
    let at = at
        .replace_nanosecond(0)
        .map_err(|e| CertKitError::EncodingError(e.to_string()))?;
    let system_time: std::time::SystemTime = at.into();
    let encoded = if at.year() < 2050 {
        x509_cert::time::Time::UtcTime(der::asn1::UtcTime::from_system_time(system_time)?)
    } else {
        x509_cert::time::Time::GeneralTime(der::asn1::GeneralizedTime::from_system_time(
            system_time,
        )?)
    };
    Ok(encoded)
}

/// Inverse of [`to_x509_time`].
pub(crate) fn from_x509_time(at: &x509_cert::time::Time) -> time::OffsetDateTime {
    time::OffsetDateTime::from(at.to_system_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_time_encoding_switches_at_2050() {
        let before = to_x509_time(datetime!(2049-12-31 23:59:59 UTC)).unwrap();
        assert!(matches!(before, x509_cert::time::Time::UtcTime(_)));

        let after = to_x509_time(datetime!(2050-01-01 00:00:00 UTC)).unwrap();
        assert!(matches!(after, x509_cert::time::Time::GeneralTime(_)));
    }

    #[test]
    fn test_time_round_trip_drops_subseconds() {
        let at = datetime!(2031-07-04 12:00:00.750 UTC);
        let encoded = to_x509_time(at).unwrap();
        assert_eq!(from_x509_time(&encoded), datetime!(2031-07-04 12:00:00 UTC));
    }
}
