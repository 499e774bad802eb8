// Self-signed certificate generation for test setups
use crate::core_tls::error::TlsError;
use log::info;
use rcgen::{CertificateParams, DnType, KeyPair};
use std::fs;
use std::path::Path;

/// Generates a self-signed certificate for `hostname` unless both files exist.
///
/// Returns true when a new pair was written.
pub fn ensure_self_signed(cert_path: &Path, key_path: &Path, hostname: &str) -> Result<bool, TlsError> {
    if cert_path.exists() && key_path.exists() {
        return Ok(false);
    }
    generate_self_signed(cert_path, key_path, hostname)?;
    Ok(true)
}

pub fn generate_self_signed(cert_path: &Path, key_path: &Path, hostname: &str) -> Result<(), TlsError> {
    let key_pair =
        KeyPair::generate().map_err(|e| TlsError::CertificateGenerationError(e.to_string()))?;

    let mut params = CertificateParams::new(vec![hostname.to_string()])
        .map_err(|e| TlsError::CertificateGenerationError(e.to_string()))?;
    params
        .distinguished_name
        .push(DnType::CommonName, hostname);

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| TlsError::CertificateGenerationError(e.to_string()))?;

    if let Some(parent) = cert_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| TlsError::CertificateGenerationError(e.to_string()))?;
    }
    if let Some(parent) = key_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| TlsError::CertificateGenerationError(e.to_string()))?;
    }

    fs::write(cert_path, cert.pem())
        .map_err(|e| TlsError::CertificateGenerationError(format!("{:?}: {}", cert_path, e)))?;
    fs::write(key_path, key_pair.serialize_pem())
        .map_err(|e| TlsError::CertificateGenerationError(format!("{:?}: {}", key_path, e)))?;

    info!(
        "Generated self-signed certificate for {} in {:?}",
        hostname, cert_path
    );
    Ok(())
}
