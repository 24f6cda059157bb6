use std::net::IpAddr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::Any;
use der::Tag;
use der::Tagged;
use der::asn1::{Ia5StringRef, PrintableStringRef, SetOfVec};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
pub use crate::cert::extensions::{FlagSet, KeyUsages};
use crate::error::CertKitError;
use crate::key::PublicKey;

/// PKCS#9 `emailAddress` attribute (1.2.840.113549.1.9.1).
pub const EMAIL_ADDRESS_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `serial_number` - The certificate serial number.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `validity` - The validity window.
/// * `key_usage` - Key usage bits, encoded as a critical extension when non-empty.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `dns_names` - DNS subject alternative names.
/// * `ip_addresses` - IP subject alternative names.
/// * `subject_key_id` - Explicit subject key identifier; derived from the key for CAs when absent.
#[derive(Clone, Debug, Builder)]
pub struct CertificateTemplate {
    pub serial_number: u64,
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    pub validity: Validity,
    #[builder(default)]
    pub key_usage: FlagSet<KeyUsages>,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub dns_names: Vec<String>,
    #[builder(default)]
    pub ip_addresses: Vec<IpAddr>,
    pub subject_key_id: Option<Vec<u8>>,
}

/// Organizational metadata placed in every generated subject.
///
/// The defaults describe a fictional development organization; override any
/// field through the builder:
///
/// ```
/// use testssl::cert::params::SubjectConfig;
///
/// let config = SubjectConfig::builder().organization("Acme Dev").build();
/// assert_eq!(config.organization, "Acme Dev");
/// assert_eq!(config.country, "US");
/// ```
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct SubjectConfig {
    /// O, default `Example Ltd.`
    #[builder(into, default = "Example Ltd.".to_string())]
    pub organization: String,
    /// C, default `US`
    #[builder(into, default = "US".to_string())]
    pub country: String,
    /// ST, default `South Carolina`
    #[builder(into, default = "South Carolina".to_string())]
    pub province: String,
    /// L, default `Greenville`
    #[builder(into, default = "Greenville".to_string())]
    pub locality: String,
    /// street, default `150 Cleveland Park Dr`
    #[builder(into, default = "150 Cleveland Park Dr".to_string())]
    pub street_address: String,
    /// postalCode, default `29601`
    #[builder(into, default = "29601".to_string())]
    pub postal_code: String,
    /// OU, default `Development`
    #[builder(into, default = "Development".to_string())]
    pub organizational_unit: String,
    /// Local part of the subject email address, default `example`.
    #[builder(into, default = "example".to_string())]
    pub email_local_part: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `street_address` - The street address (street).
/// * `postal_code` - The postal code.
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
/// * `email_address` - PKCS#9 email address, encoded as IA5String.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
    pub email_address: Option<String>,
}

impl DistinguishedName {
    /// Subject identity for `hostname` with the organizational fields of `config`.
    pub fn for_host(hostname: &str, config: &SubjectConfig) -> Self {
        DistinguishedName {
            common_name: hostname.to_string(),
            country: Some(config.country.clone()),
            state: Some(config.province.clone()),
            locality: Some(config.locality.clone()),
            street_address: Some(config.street_address.clone()),
            postal_code: Some(config.postal_code.clone()),
            organization: Some(config.organization.clone()),
            organization_unit: Some(config.organizational_unit.clone()),
            email_address: Some(format!("{}@{hostname}", config.email_local_part)),
        }
    }

    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Attributes are emitted one per RDN in the order C, ST, L, street,
    /// postalCode, O, OU, CN, emailAddress. Absent fields are skipped.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName, CertKitError> {
        use const_oid::db::rfc4519;

        let directory_attrs = [
            (rfc4519::C, self.country.as_deref()),
            (rfc4519::ST, self.state.as_deref()),
            (rfc4519::L, self.locality.as_deref()),
            (rfc4519::STREET, self.street_address.as_deref()),
            (rfc4519::POSTAL_CODE, self.postal_code.as_deref()),
            (rfc4519::O, self.organization.as_deref()),
            (rfc4519::OU, self.organization_unit.as_deref()),
            (rfc4519::CN, Some(self.common_name.as_str()).filter(|cn| !cn.is_empty())),
        ];

        let mut rdns = Vec::new();
        for (oid, value) in directory_attrs {
            if let Some(value) = value {
                rdns.push(single_attribute_rdn(oid, directory_string(value)?)?);
            }
        }
        if let Some(email) = &self.email_address {
            Ia5StringRef::new(email)
                .map_err(|e| CertKitError::InvalidInput(format!("email address: {e}")))?;
            let value = Any::new(Tag::Ia5String, email.as_bytes())?;
            rdns.push(single_attribute_rdn(EMAIL_ADDRESS_OID, value)?);
        }

        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes this crate does not produce are ignored.
    pub fn from_x509_name(
        x509dn: &x509_cert::name::DistinguishedName,
    ) -> Result<Self, CertKitError> {
        use const_oid::db::rfc4519;

        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let text = attribute_text(&attr.value)?;
                match attr.oid {
                    rfc4519::CN => dn.common_name = text,
                    rfc4519::C => dn.country = Some(text),
                    rfc4519::ST => dn.state = Some(text),
                    rfc4519::L => dn.locality = Some(text),
                    rfc4519::STREET => dn.street_address = Some(text),
                    rfc4519::POSTAL_CODE => dn.postal_code = Some(text),
                    rfc4519::O => dn.organization = Some(text),
                    rfc4519::OU => dn.organization_unit = Some(text),
                    EMAIL_ADDRESS_OID => dn.email_address = Some(text),
                    _ => {}
                }
            }
        }
        Ok(dn)
    }
}

fn single_attribute_rdn(
    oid: ObjectIdentifier,
    value: Any,
) -> Result<RelativeDistinguishedName, CertKitError> {
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])?;
    Ok(RelativeDistinguishedName(set))
}

// PrintableString when the alphabet allows it, UTF8String otherwise.
fn directory_string(value: &str) -> Result<Any, CertKitError> {
    let tag = if PrintableStringRef::new(value).is_ok() {
        Tag::PrintableString
    } else {
        Tag::Utf8String
    };
    Ok(Any::new(tag, value.as_bytes())?)
}

fn attribute_text(value: &Any) -> Result<String, CertKitError> {
    let text = match value.tag() {
        Tag::PrintableString => value.decode_as::<PrintableStringRef<'_>>()?.to_string(),
        Tag::Utf8String => value.decode_as::<String>()?,
        Tag::Ia5String => value.decode_as::<Ia5StringRef<'_>>()?.to_string(),
        tag => {
            return Err(CertKitError::DecodingError(format!(
                "unsupported name attribute encoding {tag}"
            )));
        }
    };
    Ok(text)
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now and ending `years` calendar years later.
    pub fn for_years(years: i32) -> Self {
        Self::years_from(OffsetDateTime::now_utc(), years)
    }

    /// A window of `years` calendar years starting at `start`.
    ///
    /// February 29th rolls over to March 1st when the end year is not a leap year.
    pub fn years_from(start: OffsetDateTime, years: i32) -> Self {
        let target_year = start.year() + years;
        let not_after = match start.replace_year(target_year) {
            Ok(end) => end,
            Err(_) => {
                // Only Feb 29 can fail here; step back a day and forward again.
                let shifted = start - Duration::days(1);
                match shifted.replace_year(target_year) {
                    Ok(end) => end + Duration::days(1),
                    Err(_) => start + Duration::days(365 * i64::from(years)),
                }
            }
        };
        Self {
            not_before: start,
            not_after,
        }
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CertKitError> {
        let value = extension.to_x509_extension_value()?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CertKitError> {
        E::from_x509_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};
    use time::macros::datetime;

    #[test]
    fn test_subject_for_host_uses_config_defaults() {
        let dn = DistinguishedName::for_host("example.com", &SubjectConfig::default());
        assert_eq!(dn.common_name, "example.com");
        assert_eq!(dn.organization.as_deref(), Some("Example Ltd."));
        assert_eq!(dn.country.as_deref(), Some("US"));
        assert_eq!(dn.state.as_deref(), Some("South Carolina"));
        assert_eq!(dn.locality.as_deref(), Some("Greenville"));
        assert_eq!(dn.street_address.as_deref(), Some("150 Cleveland Park Dr"));
        assert_eq!(dn.postal_code.as_deref(), Some("29601"));
        assert_eq!(dn.organization_unit.as_deref(), Some("Development"));
        assert_eq!(dn.email_address.as_deref(), Some("example@example.com"));
    }

    #[test]
    fn test_x509_name_encoding_decoding() {
        let original = DistinguishedName::for_host("pero.zdero", &SubjectConfig::default());
        let der = original.as_x509_name().unwrap().to_der().unwrap();
        let parsed = x509_cert::name::DistinguishedName::from_der(&der).unwrap();
        let decoded = DistinguishedName::from_x509_name(&parsed).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_x509_name_attribute_order_and_tags() {
        let dn = DistinguishedName::for_host("example.test", &SubjectConfig::default());
        let name = dn.as_x509_name().unwrap();
        let attrs: Vec<_> = name.0.iter().flat_map(|rdn| rdn.0.iter()).collect();

        let oids: Vec<ObjectIdentifier> = attrs.iter().map(|attr| attr.oid).collect();
        use const_oid::db::rfc4519;
        assert_eq!(
            oids,
            vec![
                rfc4519::C,
                rfc4519::ST,
                rfc4519::L,
                rfc4519::STREET,
                rfc4519::POSTAL_CODE,
                rfc4519::O,
                rfc4519::OU,
                rfc4519::CN,
                EMAIL_ADDRESS_OID,
            ]
        );
        assert_eq!(EMAIL_ADDRESS_OID.to_string(), "1.2.840.113549.1.9.1");

        let email = attrs.last().unwrap();
        assert_eq!(email.value.tag(), Tag::Ia5String);
        assert_eq!(attrs[0].value.tag(), Tag::PrintableString);
    }

    #[test]
    fn test_non_printable_values_use_utf8() {
        let config = SubjectConfig::builder().organization("Dev & Test_Co").build();
        let name = DistinguishedName::for_host("example.com", &config)
            .as_x509_name()
            .unwrap();
        let org = name
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attr| attr.oid == const_oid::db::rfc4519::O)
            .unwrap();
        assert_eq!(org.value.tag(), Tag::Utf8String);
    }

    #[test]
    fn test_validity_for_years() {
        let start = datetime!(2024-05-17 10:30:00 UTC);
        let validity = Validity::years_from(start, 10);
        assert_eq!(validity.not_before, start);
        assert_eq!(validity.not_after, datetime!(2034-05-17 10:30:00 UTC));
    }

    #[test]
    fn test_validity_leap_day_rolls_forward() {
        let start = datetime!(2024-02-29 08:00:00 UTC);
        let validity = Validity::years_from(start, 10);
        assert_eq!(validity.not_after, datetime!(2034-03-01 08:00:00 UTC));
    }
}
