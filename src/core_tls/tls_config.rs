// TLS configuration for fixtureftpd
use crate::core_tls::error::TlsError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain FTP, no TLS at all
    #[default]
    None,
    /// The TLS handshake happens right after accept (FTPS)
    Implicit,
    /// The control connection starts plaintext and is upgraded by AUTH
    Explicit,
}

/// Channels on which TLS can be made mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TlsRequirement {
    Control,
    Data,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub mode: TlsMode,

    /// Path to the PEM certificate chain
    pub cert_file: PathBuf,

    /// Path to the PEM private key
    pub key_file: PathBuf,

    /// Channels on which TLS is required
    pub require: Vec<TlsRequirement>,

    /// When set, a self-signed pair is generated in this directory if missing
    pub gen_certs_dir: Option<PathBuf>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            mode: TlsMode::None,
            cert_file: PathBuf::from("test.crt"),
            key_file: PathBuf::from("test.key"),
            require: Vec::new(),
            gen_certs_dir: None,
        }
    }
}

impl TlsConfig {
    /// Certificate path after taking the generation directory into account.
    pub fn cert_path(&self) -> PathBuf {
        match &self.gen_certs_dir {
            Some(dir) => dir.join(&self.cert_file),
            None => self.cert_file.clone(),
        }
    }

    pub fn key_path(&self) -> PathBuf {
        match &self.gen_certs_dir {
            Some(dir) => dir.join(&self.key_file),
            None => self.key_file.clone(),
        }
    }

    pub fn policy(&self) -> TlsPolicy {
        TlsPolicy {
            mode: self.mode,
            control_required: self.require.contains(&TlsRequirement::Control),
            data_required: self.require.contains(&TlsRequirement::Data),
        }
    }

    /// Checks that the TLS configuration is coherent.
    pub fn validate(&self) -> Result<(), TlsError> {
        if self.mode == TlsMode::None {
            if !self.require.is_empty() {
                return Err(TlsError::TlsConfigError(
                    "TLS requirements given but TLS mode is none".to_string(),
                ));
            }
            return Ok(());
        }

        // Missing files are fine when they are about to be generated.
        if self.gen_certs_dir.is_some() {
            return Ok(());
        }

        if !self.cert_path().exists() {
            return Err(TlsError::CertificateLoadError(format!(
                "Certificate file not found: {:?}",
                self.cert_path()
            )));
        }

        if !self.key_path().exists() {
            return Err(TlsError::PrivateKeyLoadError(format!(
                "Private key file not found: {:?}",
                self.key_path()
            )));
        }

        Ok(())
    }
}

/// The immutable, process-wide TLS policy every session consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlsPolicy {
    pub mode: TlsMode,
    pub control_required: bool,
    pub data_required: bool,
}
