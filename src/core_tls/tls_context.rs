// TLS context shared by every session of fixtureftpd
use crate::core_tls::error::TlsError;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Holds the certificate material loaded at startup and secures plaintext
/// streams with it, on the control connection as well as on data connections.
#[derive(Clone)]
pub struct TlsContext {
    acceptor: TlsAcceptor,
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TlsContext")
    }
}

impl TlsContext {
    pub fn new(cert_file: &Path, key_file: &Path) -> Result<Self, TlsError> {
        let certs = load_certs(cert_file)?;
        let key = load_private_key(key_file)?;

        let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;

        debug!("TLS context loaded from {:?} and {:?}", cert_file, key_file);

        Ok(Self {
            acceptor: TlsAcceptor::from(Arc::new(config)),
        })
    }

    /// Runs the server side of the handshake over `stream`.
    pub async fn wrap(&self, stream: TcpStream) -> Result<TlsStream<TcpStream>, TlsError> {
        self.acceptor
            .accept(stream)
            .await
            .map_err(|e| TlsError::TlsHandshakeError(e.to_string()))
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path)
        .map_err(|e| TlsError::CertificateLoadError(format!("{:?}: {}", path, e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::CertificateLoadError(format!("{:?}: {}", path, e)))?;

    if certs.is_empty() {
        return Err(TlsError::CertificateLoadError(format!(
            "No certificate found in {:?}",
            path
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path)
        .map_err(|e| TlsError::PrivateKeyLoadError(format!("{:?}: {}", path, e)))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| TlsError::PrivateKeyLoadError(format!("{:?}: {}", path, e)))?
        .ok_or_else(|| TlsError::PrivateKeyLoadError(format!("No private key found in {:?}", path)))
}
