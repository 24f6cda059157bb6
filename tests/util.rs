use testssl::SubjectConfig;
use testssl::issuer::{IssuedCertificate, issue_leaf, issue_root};

#[allow(dead_code)]
pub fn generate_ca_cert(hostname: &str) -> IssuedCertificate {
    issue_root(hostname, &SubjectConfig::default()).expect("root CA issuance")
}

#[allow(dead_code)]
pub fn generate_chain(hostname: &str) -> (IssuedCertificate, IssuedCertificate) {
    let root = generate_ca_cert(hostname);
    let server = issue_leaf(hostname, &SubjectConfig::default(), &root).expect("server issuance");
    (root, server)
}
