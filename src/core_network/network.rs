use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::server::ServerContext;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// The control port listener. Every accepted client gets its own task.
pub struct FtpServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl FtpServer {
    pub async fn bind(
        hostname: &str,
        port: u16,
        context: Arc<ServerContext>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind((hostname, port)).await?;
        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn serve(self) -> std::io::Result<()> {
        loop {
            let (socket, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            info!("New connection from {:?}", addr);

            let context = Arc::clone(&self.context);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, addr, context).await {
                    warn!("Connection error for {:?}: {}", addr, e);
                }
                info!("Connection closed for {:?}", addr);
            });
        }
    }
}

pub async fn handle_connection(
    socket: TcpStream,
    peer_addr: SocketAddr,
    context: Arc<ServerContext>,
) -> Result<(), CommandError> {
    let local_addr = socket.local_addr()?;
    let (stream, tls_state) = context.bootstrap.establish(socket).await?;

    ControlConnection::new(stream, tls_state, context, local_addr, peer_addr)
        .run()
        .await
}
