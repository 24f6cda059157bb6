use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::cert::params::SubjectConfig;
use crate::domain;
use crate::error::CertKitError;
use crate::issuer::{IssuedCertificate, issue_leaf, issue_root};

pub const ROOT_CA_STEM: &str = "rootCA";
pub const SERVER_STEM: &str = "server";

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "ssl";

/// Unix permission bits for private key files.
pub const KEY_FILE_MODE: u32 = 0o600;
/// Unix permission bits for certificate files.
pub const CERT_FILE_MODE: u32 = 0o644;

/// The root CA and the server certificate it signed.
#[derive(Debug, Clone)]
pub struct GeneratedCertificates {
    pub hostname: String,
    pub root: IssuedCertificate,
    pub server: IssuedCertificate,
}

/// Normalizes `domain` and issues a root CA plus a server certificate for it.
///
/// Nothing is written to disk; see [`GeneratedCertificates::write_to_dir`].
pub fn generate_certificates(
    domain: &str,
    config: &SubjectConfig,
) -> Result<GeneratedCertificates, CertKitError> {
    let hostname = domain::normalize(domain)?;
    tracing::info!("Using {hostname} as domain name");

    let root = issue_root(&hostname, config)?;
    let server = issue_leaf(&hostname, config, &root)?;

    Ok(GeneratedCertificates {
        hostname,
        root,
        server,
    })
}

impl GeneratedCertificates {
    /// Writes `rootCA.pem`, `rootCA.key`, `server.pem` and `server.key` into `dir`.
    ///
    /// The directory is created if it does not exist. Returns the written paths
    /// in that order.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, CertKitError> {
        let dir = dir.as_ref();
        if dir.is_dir() {
            tracing::info!("Folder {} already exists", dir.display());
        } else {
            fs::create_dir_all(dir)?;
        }
        tracing::info!("Using {} as folder for output", dir.display());

        let mut written = Vec::with_capacity(4);
        for (stem, issued) in [(ROOT_CA_STEM, &self.root), (SERVER_STEM, &self.server)] {
            let cert_path = dir.join(format!("{stem}.pem"));
            write_file(&cert_path, issued.cert_pem.as_bytes(), CERT_FILE_MODE)?;
            written.push(cert_path);

            let key_path = dir.join(format!("{stem}.key"));
            write_file(&key_path, issued.key_pem.as_bytes(), KEY_FILE_MODE)?;
            written.push(key_path);
        }
        Ok(written)
    }
}

// The mode is reset on every open: `create` leaves an existing file's bits alone.
fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<(), CertKitError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    set_mode(&file, mode)?;
    file.write_all(contents)?;
    file.sync_all()?;
    tracing::info!("Created file: {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_domain_generates_nothing() {
        assert!(matches!(
            generate_certificates("", &SubjectConfig::default()),
            Err(CertKitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hostname_is_normalized() {
        let generated = generate_certificates("www.example", &SubjectConfig::default()).unwrap();
        assert_eq!(generated.hostname, "example.test");
        assert_eq!(
            generated.server.cert.to_cert_info().unwrap().subject.common_name,
            "example.test"
        );
    }
}
