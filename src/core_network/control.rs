use crate::constants::{MAX_COMMAND_LINE_LENGTH, SERVER_BANNER};
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::dispatch;
use crate::core_network::stream::FtpStream;
use crate::core_tls::{TlsContext, TlsError};
use crate::server::ServerContext;
use crate::session::{Session, SessionState, TlsState};
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

enum Line {
    Text(String),
    TooLong,
}

/// One client's control connection: the command stream, the reply writer
/// and the session state the handlers operate on.
pub struct ControlConnection {
    reader: BufReader<FtpStream>,
    pub session: Session,
    pub context: Arc<ServerContext>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl ControlConnection {
    pub fn new(
        stream: FtpStream,
        tls_state: TlsState,
        context: Arc<ServerContext>,
        local_addr: SocketAddr,
        peer_addr: SocketAddr,
    ) -> Self {
        Self {
            reader: BufReader::new(stream),
            session: Session::new(tls_state),
            context,
            local_addr,
            peer_addr,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Sends a single-line reply.
    pub async fn reply(&mut self, code: u16, text: &str) -> std::io::Result<()> {
        self.send_line(&format!("{} {}", code, text)).await
    }

    /// Sends a reply already formatted as `"<code> <text>"`.
    pub async fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        debug!("[{}] -> {}", self.peer_addr, line);
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await
    }

    /// Sends `code-first`, the body lines as given, then `code last`.
    pub async fn reply_multiline(
        &mut self,
        code: u16,
        first: &str,
        body: &[String],
        last: &str,
    ) -> std::io::Result<()> {
        let mut reply = format!("{}-{}\r\n", code, first);
        for line in body {
            reply.push_str(line);
            reply.push_str("\r\n");
        }
        reply.push_str(&format!("{} {}\r\n", code, last));
        debug!("[{}] -> {}", self.peer_addr, reply.trim_end());

        let stream = self.reader.get_mut();
        stream.write_all(reply.as_bytes()).await?;
        stream.flush().await
    }

    /// True when the client has sent bytes we have read but not yet parsed.
    pub fn has_buffered_input(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    /// Runs the server side of the TLS handshake on the control stream.
    ///
    /// Nothing may be buffered: plaintext sent before the handshake must
    /// never be read as if it had been protected.
    pub async fn upgrade_to_tls(&mut self, tls: &TlsContext) -> Result<(), TlsError> {
        if self.has_buffered_input() {
            return Err(TlsError::TlsConfigError(
                "plaintext buffered ahead of the TLS handshake".to_string(),
            ));
        }

        match std::mem::replace(self.reader.get_mut(), FtpStream::Detached) {
            FtpStream::Plain(stream) => {
                let secured = tls.wrap(stream).await?;
                *self.reader.get_mut() = FtpStream::from(secured);
                self.session.secure_control();
                Ok(())
            }
            other => {
                let already_secure = other.is_secure();
                *self.reader.get_mut() = other;
                Err(TlsError::TlsConfigError(if already_secure {
                    "control connection is already secured".to_string()
                } else {
                    "control connection is not available".to_string()
                }))
            }
        }
    }

    /// Runs a data transfer while watching the control connection.
    ///
    /// If the client hangs up first, the transfer is dropped together with
    /// its data connection and port lease. Commands sent meanwhile stay
    /// buffered for the command loop.
    pub async fn guard_transfer<T, F>(&mut self, transfer: F) -> Result<T, CommandError>
    where
        F: Future<Output = Result<T, CommandError>>,
    {
        let peer = self.peer_addr;
        tokio::pin!(transfer);

        tokio::select! {
            result = &mut transfer => return result,
            pending = self.reader.fill_buf() => match pending {
                Ok(buf) if !buf.is_empty() => {}
                Ok(_) => {
                    warn!("[{}] Control connection closed during transfer", peer);
                    return Err(CommandError::ControlClosed);
                }
                Err(e) => {
                    warn!("[{}] Control connection failed during transfer: {}", peer, e);
                    return Err(CommandError::ControlClosed);
                }
            },
        }

        transfer.await
    }

    async fn read_line(&mut self) -> std::io::Result<Option<Line>> {
        let limit = MAX_COMMAND_LINE_LENGTH as u64;
        let mut buf = Vec::new();
        let n = (&mut self.reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }

        if !buf.ends_with(b"\n") && n as u64 == limit {
            // Skip the rest of the oversized line.
            loop {
                let mut rest = Vec::new();
                let m = (&mut self.reader).take(limit).read_until(b'\n', &mut rest).await?;
                if m == 0 || rest.ends_with(b"\n") {
                    break;
                }
            }
            return Ok(Some(Line::TooLong));
        }

        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        Ok(Some(Line::Text(line)))
    }

    /// Greets the client and processes commands until QUIT, disconnect or a
    /// fatal control channel error.
    pub async fn run(mut self) -> Result<(), CommandError> {
        self.reply(220, SERVER_BANNER).await?;

        let result = self.command_loop().await;

        self.session.close();
        if let Err(e) = self.reader.get_mut().shutdown().await {
            debug!("[{}] Shutdown of control connection failed: {}", self.peer_addr, e);
        }
        result
    }

    async fn command_loop(&mut self) -> Result<(), CommandError> {
        while self.session.state() != SessionState::Closed {
            let line = match self.read_line().await {
                Ok(Some(Line::Text(line))) => line,
                Ok(Some(Line::TooLong)) => {
                    warn!("[{}] Command line too long", self.peer_addr);
                    self.reply(500, "Command line too long.").await?;
                    continue;
                }
                Ok(None) => {
                    info!("[{}] Client disconnected", self.peer_addr);
                    break;
                }
                Err(e) => {
                    warn!("[{}] Failed to read from control connection: {}", self.peer_addr, e);
                    break;
                }
            };

            dispatch(self, &line).await?;
        }
        Ok(())
    }
}
