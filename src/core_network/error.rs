// Data channel errors: all of them fail the pending transfer only
use crate::core_network::port_pool::PoolError;
use crate::core_tls::TlsError;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error(transparent)]
    PoolExhausted(#[from] PoolError),

    #[error("Failed to listen on passive port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept data connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Timed out waiting for the data connection")]
    Timeout,

    #[error("Data channel TLS failure: {0}")]
    Tls(#[from] TlsError),
}

impl DataChannelError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            DataChannelError::PoolExhausted(_) => {
                "425 Can't open data connection: no free passive port.".to_string()
            }
            DataChannelError::Tls(TlsError::TlsNotConfigured) => {
                TlsError::TlsNotConfigured.to_ftp_response()
            }
            _ => "425 Can't open data connection.".to_string(),
        }
    }
}
