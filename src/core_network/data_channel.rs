use crate::constants::DATA_CONNECT_TIMEOUT;
use crate::core_network::error::DataChannelError;
use crate::core_network::port_pool::PortLease;
use crate::core_network::stream::FtpStream;
use crate::core_tls::{TlsContext, TlsError};
use log::{debug, info, warn};
use std::net::{IpAddr, SocketAddr};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// How the next data connection gets established.
#[derive(Debug)]
pub enum DataChannelMode {
    /// We listen, the client connects in. The lease is `None` when no passive
    /// range is configured and the listener sits on an ephemeral port.
    Passive {
        listener: TcpListener,
        lease: Option<PortLease>,
        peer_ip: IpAddr,
    },
    /// We connect out to the endpoint the client gave us.
    Active { addr: SocketAddr },
}

/// The pending data channel of a session, created by PASV/EPSV/PORT and
/// consumed by the next transfer command.
#[derive(Debug)]
pub struct DataChannel {
    mode: DataChannelMode,
    tls_required: bool,
}

impl DataChannel {
    pub fn passive(
        listener: TcpListener,
        lease: Option<PortLease>,
        peer_ip: IpAddr,
        tls_required: bool,
    ) -> Self {
        Self {
            mode: DataChannelMode::Passive {
                listener,
                lease,
                peer_ip,
            },
            tls_required,
        }
    }

    pub fn active(addr: SocketAddr, tls_required: bool) -> Self {
        Self {
            mode: DataChannelMode::Active { addr },
            tls_required,
        }
    }

    pub fn mode(&self) -> &DataChannelMode {
        &self.mode
    }

    pub fn tls_required(&self) -> bool {
        self.tls_required
    }

    pub fn set_tls_required(&mut self, tls_required: bool) {
        self.tls_required = tls_required;
    }

    /// Opens the connection and secures it if required.
    ///
    /// Consumes the descriptor: the passive listener is closed as soon as one
    /// connection has been accepted, or when this returns an error.
    pub async fn establish(self, tls: Option<&TlsContext>) -> Result<DataConnection, DataChannelError> {
        let (stream, lease) = match self.mode {
            DataChannelMode::Passive {
                listener,
                lease,
                peer_ip,
            } => {
                let stream = timeout(DATA_CONNECT_TIMEOUT, accept_from(&listener, peer_ip))
                    .await
                    .map_err(|_| DataChannelError::Timeout)??;
                (stream, lease)
            }
            DataChannelMode::Active { addr } => {
                debug!("Connecting to active data endpoint {}", addr);
                let stream = timeout(DATA_CONNECT_TIMEOUT, TcpStream::connect(addr))
                    .await
                    .map_err(|_| DataChannelError::Timeout)?
                    .map_err(|source| DataChannelError::Connect { addr, source })?;
                (stream, None)
            }
        };

        let stream = if self.tls_required {
            let tls = tls.ok_or(TlsError::TlsNotConfigured)?;
            let secured = timeout(DATA_CONNECT_TIMEOUT, tls.wrap(stream))
                .await
                .map_err(|_| DataChannelError::Timeout)??;
            debug!("Data connection secured with TLS");
            FtpStream::from(secured)
        } else {
            FtpStream::from(stream)
        };

        Ok(DataConnection {
            stream,
            _lease: lease,
        })
    }
}

async fn accept_from(listener: &TcpListener, peer_ip: IpAddr) -> Result<TcpStream, DataChannelError> {
    loop {
        let (stream, addr) = listener.accept().await.map_err(DataChannelError::Accept)?;
        if addr.ip().to_canonical() == peer_ip.to_canonical() {
            info!("Accepted data connection from {}", addr);
            return Ok(stream);
        }
        warn!(
            "Rejected data connection from foreign address {} (expected {})",
            addr, peer_ip
        );
    }
}

/// An open data connection. Holds on to the passive port lease, if any,
/// until the connection is dropped.
#[derive(Debug)]
pub struct DataConnection {
    pub stream: FtpStream,
    _lease: Option<PortLease>,
}

impl DataConnection {
    /// Flushes and closes the connection, sending close_notify on TLS.
    pub async fn close(mut self) -> std::io::Result<()> {
        self.stream.shutdown().await
    }
}
