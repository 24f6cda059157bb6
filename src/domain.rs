//! Hostname normalization for user supplied domains.
//!
//! The input may be a bare label (`example`), a hostname (`www.example.com`)
//! or a URL (`https://example.com/path`). The result is the name used as the
//! certificate common name and DNS subject alternative name.

use url::Url;

use crate::error::CertKitError;

/// Longest hostname accepted, per RFC 1035.
pub const MAX_DOMAIN_LEN: usize = 253;

/// Top-level label appended to bare labels (reserved by RFC 6761).
pub const FALLBACK_TLD: &str = ".test";

const WWW_PREFIX: &str = "www.";

/// Turn a raw domain string into a canonical hostname.
///
/// # Errors
/// Returns [`CertKitError::InvalidInput`] when the input is empty, longer
/// than [`MAX_DOMAIN_LEN`], not parseable, or normalizes to a name that
/// cannot be placed in a certificate.
///
/// # Example
/// ```
/// use testssl::domain::normalize;
/// assert_eq!(normalize("example").unwrap(), "example.test");
/// assert_eq!(normalize("www.example.com").unwrap(), "example.com");
/// assert_eq!(normalize("https://www.example.org/path").unwrap(), "example.org");
/// ```
pub fn normalize(raw: &str) -> Result<String, CertKitError> {
    if raw.is_empty() {
        return Err(CertKitError::InvalidInput("missing domain name".to_string()));
    }
    if raw.chars().count() > MAX_DOMAIN_LEN {
        return Err(CertKitError::InvalidInput(format!(
            "max allowed length for a domain is {MAX_DOMAIN_LEN} characters"
        )));
    }

    let host = match url_host(raw)? {
        Some(host) => strip_www(&host).to_string(),
        None => {
            let name = strip_www(raw);
            if name.contains('.') {
                name.to_string()
            } else {
                format!("{name}{FALLBACK_TLD}")
            }
        }
    };

    validate_host(&host)?;
    Ok(host)
}

/// Host component of `raw` when it parses as a URL with an authority.
fn url_host(raw: &str) -> Result<Option<String>, CertKitError> {
    match Url::parse(raw) {
        Ok(url) => Ok(url
            .host_str()
            .filter(|host| !host.is_empty())
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(None),
        Err(e) => Err(CertKitError::InvalidInput(format!(
            "problem with parsing domain name `{raw}`: {e}"
        ))),
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix(WWW_PREFIX).unwrap_or(host)
}

fn validate_host(host: &str) -> Result<(), CertKitError> {
    if host.is_empty() || host == FALLBACK_TLD {
        return Err(CertKitError::InvalidInput(
            "domain name has no host part".to_string(),
        ));
    }
    if host.len() > MAX_DOMAIN_LEN {
        return Err(CertKitError::InvalidInput(format!(
            "normalized domain `{host}` exceeds {MAX_DOMAIN_LEN} characters"
        )));
    }
    if !host.is_ascii() {
        return Err(CertKitError::InvalidInput(format!(
            "domain `{host}` must be ASCII; use its punycode form"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenarios() {
        let cases = [
            ("example.com", "example.com"),
            ("example", "example.test"),
            ("pero.zdero", "pero.zdero"),
            ("www.example.com", "example.com"),
            ("http://www.example.com/some/path", "example.com"),
            ("https://api.example.com:8443", "api.example.com"),
            ("localhost", "localhost.test"),
            ("www.example", "example.test"),
            ("example.www.com", "example.www.com"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_empty_domain_is_rejected() {
        assert!(matches!(normalize(""), Err(CertKitError::InvalidInput(_))));
    }

    #[test]
    fn test_domain_length_limit() {
        let longest = format!("{}.com", "a".repeat(MAX_DOMAIN_LEN - 4));
        assert_eq!(normalize(&longest).unwrap(), longest);

        let too_long = format!("{}.com", "a".repeat(MAX_DOMAIN_LEN - 3));
        assert!(matches!(
            normalize(&too_long),
            Err(CertKitError::InvalidInput(_))
        ));

        // Fits before the fallback label is appended, not after.
        assert!(normalize(&"a".repeat(MAX_DOMAIN_LEN)).is_err());
    }

    #[test]
    fn test_unparseable_url_is_rejected() {
        assert!(matches!(
            normalize("http://example.com:99999"),
            Err(CertKitError::InvalidInput(_))
        ));
        assert!(normalize("www.").is_err());
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        assert!(normalize("bücher.example").is_err());
    }

    proptest! {
        #[test]
        fn dotted_hosts_are_unchanged(h in "[a-z0-9][a-z0-9-]{0,20}(\\.[a-z0-9-]{1,20}){1,3}") {
            prop_assume!(!h.starts_with("www."));
            prop_assert_eq!(normalize(&h).unwrap(), h);
        }

        #[test]
        fn bare_labels_get_fallback_tld(h in "[a-z0-9][a-z0-9-]{0,40}") {
            prop_assert_eq!(normalize(&h).unwrap(), format!("{h}.test"));
        }

        #[test]
        fn www_prefix_is_ignored(h in "[a-z0-9][a-z0-9-]{0,20}(\\.[a-z0-9-]{1,20}){0,3}") {
            prop_assume!(!h.starts_with("www."));
            prop_assert_eq!(normalize(&format!("www.{h}")).unwrap(), normalize(&h).unwrap());
        }
    }
}
