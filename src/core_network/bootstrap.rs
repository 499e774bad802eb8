use crate::core_network::stream::FtpStream;
use crate::core_tls::{TlsContext, TlsError, TlsMode};
use crate::session::TlsState;
use tokio::net::TcpStream;

/// How a freshly accepted control connection is set up, chosen once at
/// startup from the TLS mode.
#[derive(Debug, Clone)]
pub enum Bootstrap {
    /// Plaintext greeting; explicit TLS servers upgrade later through AUTH.
    Plain,
    /// TLS handshake before the first byte of FTP.
    ImplicitTls(TlsContext),
}

impl Bootstrap {
    pub fn select(mode: TlsMode, tls: Option<&TlsContext>) -> Result<Self, TlsError> {
        match mode {
            TlsMode::Implicit => tls
                .cloned()
                .map(Bootstrap::ImplicitTls)
                .ok_or(TlsError::TlsNotConfigured),
            TlsMode::Explicit | TlsMode::None => Ok(Bootstrap::Plain),
        }
    }

    pub async fn establish(&self, stream: TcpStream) -> Result<(FtpStream, TlsState), TlsError> {
        match self {
            Bootstrap::Plain => Ok((FtpStream::from(stream), TlsState::Plaintext)),
            Bootstrap::ImplicitTls(tls) => {
                let secured = tls.wrap(stream).await?;
                Ok((FtpStream::from(secured), TlsState::ControlSecured))
            }
        }
    }
}
