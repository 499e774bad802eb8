use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;

/// A control or data connection, plaintext or secured.
///
/// The control connection swaps its variant in place when AUTH upgrades it,
/// so everything above this type reads and writes without caring which
/// transport is underneath.
pub enum FtpStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    /// Placeholder left behind while the stream is being upgraded.
    Detached,
}

impl std::fmt::Debug for FtpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FtpStream::Plain(stream) => write!(f, "Plain({:?})", stream.peer_addr().ok()),
            FtpStream::Tls(stream) => write!(f, "Tls({:?})", stream.get_ref().0.peer_addr().ok()),
            FtpStream::Detached => write!(f, "Detached"),
        }
    }
}

impl FtpStream {
    pub fn is_secure(&self) -> bool {
        matches!(self, FtpStream::Tls(_))
    }
}

impl From<TcpStream> for FtpStream {
    fn from(stream: TcpStream) -> Self {
        FtpStream::Plain(stream)
    }
}

impl From<TlsStream<TcpStream>> for FtpStream {
    fn from(stream: TlsStream<TcpStream>) -> Self {
        FtpStream::Tls(Box::new(stream))
    }
}

fn detached() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is being upgraded")
}

impl AsyncRead for FtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            FtpStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
            FtpStream::Detached => Poll::Ready(Err(detached())),
        }
    }
}

impl AsyncWrite for FtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            FtpStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            FtpStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
            FtpStream::Detached => Poll::Ready(Err(detached())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            FtpStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
            FtpStream::Detached => Poll::Ready(Err(detached())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            FtpStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
            FtpStream::Detached => Poll::Ready(Ok(())),
        }
    }
}
