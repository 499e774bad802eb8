// End-to-end sessions against a server on loopback
use crate::config::{Config, PassivePortRange};
use crate::core_network::network::FtpServer;
use crate::core_tls::certgen::generate_self_signed;
use crate::core_tls::{TlsMode, TlsRequirement};
use crate::server::ServerContext;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

struct Fixture {
    addr: SocketAddr,
    root: TempDir,
    certs: TempDir,
}

impl Fixture {
    async fn start(
        permissions: &str,
        mode: TlsMode,
        require: Vec<TlsRequirement>,
        passive_ports: Option<PassivePortRange>,
    ) -> Self {
        let root = tempfile::tempdir().unwrap();
        let certs = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.server.hostname = "127.0.0.1".to_string();
        config.server.passive_ports = passive_ports;
        config.user.username = Some("alice".to_string());
        config.user.password = Some("secret".to_string());
        config.user.root = Some(root.path().to_path_buf());
        config.user.permissions = permissions.to_string();
        config.tls.mode = mode;
        config.tls.require = require;
        if mode != TlsMode::None {
            let cert = certs.path().join("test.crt");
            let key = certs.path().join("test.key");
            generate_self_signed(&cert, &key, "localhost").unwrap();
            config.tls.cert_file = cert;
            config.tls.key_file = key;
        }
        config.validate().unwrap();

        let context = Arc::new(ServerContext::from_config(&config).unwrap());
        let server = FtpServer::bind("127.0.0.1", 0, context).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());

        Self { addr, root, certs }
    }

    async fn plain(permissions: &str) -> Self {
        Self::start(permissions, TlsMode::None, Vec::new(), None).await
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn connector(&self) -> TlsConnector {
        let mut roots = RootCertStore::empty();
        let file = std::fs::File::open(self.certs.path().join("test.crt")).unwrap();
        for cert in rustls_pemfile::certs(&mut std::io::BufReader::new(file)) {
            roots.add(cert.unwrap()).unwrap();
        }
        let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }
}

fn server_name() -> ServerName<'static> {
    ServerName::try_from("localhost").unwrap()
}

async fn secure(connector: &TlsConnector, stream: Box<dyn Io>) -> Box<dyn Io> {
    Box::new(connector.connect(server_name(), stream).await.unwrap())
}

/// A minimal FTP client speaking just enough of the protocol for the tests.
struct TestClient {
    reader: BufReader<Box<dyn Io>>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self::greeted(Box::new(stream)).await
    }

    async fn connect_implicit(addr: SocketAddr, connector: &TlsConnector) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self::greeted(secure(connector, Box::new(stream)).await).await
    }

    async fn greeted(stream: Box<dyn Io>) -> Self {
        let mut client = Self {
            reader: BufReader::new(stream),
        };
        let banner = client.read_reply().await;
        assert!(banner.starts_with("220 "), "unexpected banner {:?}", banner);
        client
    }

    async fn upgrade(self, connector: &TlsConnector) -> Self {
        assert!(self.reader.buffer().is_empty());
        Self {
            reader: BufReader::new(secure(connector, self.reader.into_inner()).await),
        }
    }

    async fn send(&mut self, line: &str) {
        let stream = self.reader.get_mut();
        stream
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
        stream.flush().await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut buf = Vec::new();
        let _ = self.reader.read_until(b'\n', &mut buf).await;
        String::from_utf8_lossy(&buf).trim_end().to_string()
    }

    /// Reads a whole reply, multi-line replies included.
    async fn read_reply(&mut self) -> String {
        let first = self.read_line().await;
        if first.len() < 4 || first.as_bytes()[3] != b'-' {
            return first;
        }
        let end = format!("{} ", &first[..3]);
        let mut reply = first;
        loop {
            let line = self.read_line().await;
            reply.push('\n');
            reply.push_str(&line);
            if line.starts_with(&end) || line.is_empty() {
                return reply;
            }
        }
    }

    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_reply().await
    }

    async fn login(&mut self) {
        assert!(self.command("USER alice").await.starts_with("331 "));
        assert_eq!(self.command("PASS secret").await, "230 Login successful.");
    }

    /// Sends PASV and connects to the announced endpoint.
    async fn pasv_connect(&mut self) -> TcpStream {
        let port = self.pasv().await.unwrap();
        TcpStream::connect(("127.0.0.1", port)).await.unwrap()
    }

    async fn pasv(&mut self) -> Result<u16, String> {
        let reply = self.command("PASV").await;
        if !reply.starts_with("227 ") {
            return Err(reply);
        }
        let inner = reply
            .split('(')
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .unwrap();
        let numbers: Vec<u16> = inner.split(',').map(|n| n.parse().unwrap()).collect();
        assert_eq!(&numbers[..4], &[127, 0, 0, 1]);
        Ok(numbers[4] << 8 | numbers[5])
    }
}

/// Finds two consecutive free ports on loopback.
fn free_port_pair() -> PassivePortRange {
    for _ in 0..100 {
        let first = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let port = first.local_addr().unwrap().port();
        if port == u16::MAX {
            continue;
        }
        if StdTcpListener::bind(("127.0.0.1", port + 1)).is_ok() {
            return PassivePortRange::new(port, port + 1).unwrap();
        }
    }
    panic!("no pair of consecutive free ports found");
}

/// Finds one free port on loopback.
fn free_port() -> PassivePortRange {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    PassivePortRange::new(port, port).unwrap()
}

/// Retries PASV until a port frees up or the deadline passes.
async fn pasv_within(client: &mut TestClient, deadline: Duration) -> Result<u16, String> {
    let start = Instant::now();
    loop {
        match client.pasv().await {
            Ok(port) => return Ok(port),
            Err(reply) if start.elapsed() >= deadline => return Err(reply),
            Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
}

async fn read_all(mut stream: Box<dyn Io>) -> Vec<u8> {
    let mut data = Vec::new();
    stream.read_to_end(&mut data).await.unwrap();
    data
}

#[tokio::test]
async fn test_plaintext_login() {
    let fixture = Fixture::plain("elr").await;
    let mut client = TestClient::connect(fixture.addr).await;

    assert_eq!(client.command("PWD").await, "530 Log in with USER and PASS first.");
    assert_eq!(client.command("PASS secret").await, "503 Login with USER first.");
    assert!(client.command("USER alice").await.starts_with("331 "));
    assert_eq!(client.command("PASS wrong").await, "530 Authentication failed.");
    assert_eq!(client.command("PASS secret").await, "503 Login with USER first.");

    client.login().await;
    assert_eq!(client.command("PASS secret").await, "503 User already authenticated.");
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");
    assert_eq!(client.command("SYST").await, "215 UNIX Type: L8");
    assert!(client.command("FOO").await.starts_with("500 "));
    assert!(client.command("RETR").await.starts_with("501 "));
    assert_eq!(client.command("QUIT").await, "221 Goodbye.");
}

#[tokio::test]
async fn test_read_only_user_cannot_store() {
    let fixture = Fixture::plain("elr").await;
    std::fs::write(fixture.path("a.txt"), b"abc").unwrap();
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;

    let data = client.pasv_connect().await;
    assert_eq!(client.command("STOR b.txt").await, "550 Not enough privileges.");
    assert_eq!(client.command("DELE a.txt").await, "550 Not enough privileges.");
    assert!(!fixture.path("b.txt").exists());
    assert!(fixture.path("a.txt").exists());

    // The refused command did not consume the pending data channel.
    assert!(client.command("NLST").await.starts_with("150 "));
    assert_eq!(read_all(Box::new(data)).await, b"a.txt\r\n");
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_store_and_retrieve_round_trip() {
    let fixture = Fixture::plain("elradfmw").await;
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;
    assert_eq!(client.command("TYPE I").await, "200 Type set to: Binary.");

    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let mut data = client.pasv_connect().await;
    assert!(client.command("STOR blob.bin").await.starts_with("150 "));
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
    assert_eq!(std::fs::read(fixture.path("blob.bin")).unwrap(), payload);

    assert_eq!(client.command("SIZE blob.bin").await, "213 200000");
    assert!(client.command("MDTM blob.bin").await.starts_with("213 "));

    let data = client.pasv_connect().await;
    assert!(client.command("RETR blob.bin").await.starts_with("150 "));
    assert_eq!(read_all(Box::new(data)).await, payload);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");

    assert_eq!(
        client.command("RETR blob.bin").await,
        "425 Use PORT or PASV first."
    );
}

#[tokio::test]
async fn test_directory_commands() {
    let fixture = Fixture::plain("elradfmw").await;
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;

    assert_eq!(
        client.command("MKD docs").await,
        "257 \"/docs\" directory created."
    );
    assert!(client.command("CWD docs").await.starts_with("250 "));
    assert_eq!(client.command("PWD").await, "257 \"/docs\" is the current directory.");
    assert!(client.command("CWD ../../..").await.starts_with("250 "));
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");
    assert!(client.command("CWD missing").await.starts_with("550 "));

    std::fs::write(fixture.path("docs/old.txt"), b"x").unwrap();
    assert!(client.command("RNFR docs/old.txt").await.starts_with("350 "));
    assert_eq!(client.command("RNTO docs/new.txt").await, "250 Renaming ok.");
    assert!(fixture.path("docs/new.txt").exists());
    assert!(client.command("RNTO docs/other.txt").await.starts_with("503 "));

    let data = client.pasv_connect().await;
    assert!(client.command("LIST docs").await.starts_with("150 "));
    let listing = String::from_utf8(read_all(Box::new(data)).await).unwrap();
    assert!(listing.starts_with('-'));
    assert!(listing.trim_end().ends_with(" new.txt"));
    assert_eq!(client.read_reply().await, "226 Transfer complete.");

    assert!(client.command("DELE docs/new.txt").await.starts_with("250 "));
    assert!(client.command("RMD docs").await.starts_with("250 "));
    assert!(!fixture.path("docs").exists());
}

#[tokio::test]
async fn test_active_mode_transfer() {
    let fixture = Fixture::plain("elr").await;
    std::fs::write(fixture.path("hello.txt"), b"hello").unwrap();
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;

    assert_eq!(
        client.command("PORT 127,0,0,1,0,21").await,
        "501 Can't connect over a privileged port."
    );
    assert_eq!(
        client.command("PORT 10,9,8,7,100,100").await,
        "501 Rejected data connection to foreign address."
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = client
        .command(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff))
        .await;
    assert!(reply.starts_with("200 "));

    assert!(client.command("RETR hello.txt").await.starts_with("150 "));
    let (data, _) = listener.accept().await.unwrap();
    assert_eq!(read_all(Box::new(data)).await, b"hello");
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_passive_pool_is_shared_and_released() {
    let range = free_port_pair();
    let fixture = Fixture::start("elr", TlsMode::None, Vec::new(), Some(range)).await;
    let ports = range.as_range();

    let mut first = TestClient::connect(fixture.addr).await;
    let mut second = TestClient::connect(fixture.addr).await;
    let mut third = TestClient::connect(fixture.addr).await;
    first.login().await;
    second.login().await;
    third.login().await;

    let a = first.pasv().await.unwrap();
    let b = second.pasv().await.unwrap();
    assert!(ports.contains(&a) && ports.contains(&b));
    assert_ne!(a, b);

    let refused = third.pasv().await.unwrap_err();
    assert_eq!(refused, "425 Can't open data connection: no free passive port.");

    assert_eq!(first.command("QUIT").await, "221 Goodbye.");
    assert_eq!(third.pasv().await.unwrap(), a);
}

#[tokio::test]
async fn test_implicit_tls_session() {
    let fixture = Fixture::start(
        "elr",
        TlsMode::Implicit,
        vec![TlsRequirement::Data],
        None,
    )
    .await;
    std::fs::write(fixture.path("secret.txt"), b"top secret").unwrap();
    let connector = fixture.connector();
    let mut client = TestClient::connect_implicit(fixture.addr, &connector).await;

    assert_eq!(
        client.command("AUTH TLS").await,
        "550 not supposed to be used with implicit SSL."
    );
    client.login().await;

    let _plain = client.pasv_connect().await;
    assert_eq!(
        client.command("RETR secret.txt").await,
        "522 SSL/TLS required on the data channel."
    );
    assert_eq!(
        client.command("RETR secret.txt").await,
        "425 Use PORT or PASV first."
    );

    assert_eq!(client.command("PBSZ 0").await, "200 PBSZ=0 successful.");
    assert!(client.command("PROT P").await.starts_with("200 "));

    let data = client.pasv_connect().await;
    assert!(client.command("RETR secret.txt").await.starts_with("150 "));
    let data = secure(&connector, Box::new(data)).await;
    assert_eq!(read_all(data).await, b"top secret");
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_explicit_tls_upgrade() {
    let fixture = Fixture::start("elradfmw", TlsMode::Explicit, Vec::new(), None).await;
    let connector = fixture.connector();
    let mut client = TestClient::connect(fixture.addr).await;

    assert!(client.command("FEAT").await.contains(" AUTH TLS"));
    assert!(client.command("PBSZ 0").await.starts_with("503 "));
    assert_eq!(client.command("AUTH TLS").await, "234 AUTH TLS successful.");
    let mut client = client.upgrade(&connector).await;

    assert_eq!(client.command("AUTH TLS").await, "503 Already using TLS.");
    client.login().await;
    assert_eq!(client.command("PROT P").await, "503 You must issue the PBSZ command prior to PROT.");
    assert_eq!(client.command("PBSZ 0").await, "200 PBSZ=0 successful.");
    assert!(client.command("PROT S").await.starts_with("536 "));
    assert!(client.command("PROT P").await.starts_with("200 "));

    let data = client.pasv_connect().await;
    assert!(client.command("STOR up.txt").await.starts_with("150 "));
    let mut data = secure(&connector, Box::new(data)).await;
    data.write_all(b"uploaded over tls").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
    assert_eq!(
        std::fs::read(fixture.path("up.txt")).unwrap(),
        b"uploaded over tls"
    );
}

#[tokio::test]
async fn test_plaintext_after_auth_is_never_interpreted() {
    let fixture = Fixture::start("elr", TlsMode::Explicit, Vec::new(), None).await;
    let mut client = TestClient::connect(fixture.addr).await;

    assert_eq!(client.command("AUTH TLS").await, "234 AUTH TLS successful.");
    client.send("USER alice").await;
    let reply = client.read_line().await;
    assert!(!reply.starts_with("331"), "plaintext was accepted: {:?}", reply);
}

#[tokio::test]
async fn test_control_tls_required() {
    let fixture = Fixture::start(
        "elr",
        TlsMode::Explicit,
        vec![TlsRequirement::Control],
        None,
    )
    .await;
    let connector = fixture.connector();
    let mut client = TestClient::connect(fixture.addr).await;

    assert_eq!(
        client.command("USER alice").await,
        "550 SSL/TLS required on the control channel."
    );
    assert_eq!(client.command("AUTH TLS").await, "234 AUTH TLS successful.");
    let mut client = client.upgrade(&connector).await;
    client.login().await;
}

#[tokio::test]
async fn test_tls_commands_without_tls() {
    let fixture = Fixture::plain("elr").await;
    let mut client = TestClient::connect(fixture.addr).await;
    assert!(client.command("AUTH TLS").await.starts_with("534 "));
    assert!(client.command("PBSZ 0").await.starts_with("534 "));
    assert!(!client.command("FEAT").await.contains("AUTH"));
}

#[tokio::test]
async fn test_refused_store_keeps_existing_file() {
    let fixture = Fixture::plain("elrw").await;
    std::fs::write(fixture.path("keep.txt"), b"precious data").unwrap();
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;

    assert_eq!(
        client.command("STOR keep.txt").await,
        "425 Use PORT or PASV first."
    );
    assert_eq!(std::fs::read(fixture.path("keep.txt")).unwrap(), b"precious data");

    // A store that cannot create its file leaves the pending channel usable.
    let mut data = client.pasv_connect().await;
    assert_eq!(
        client.command("STOR missing/new.txt").await,
        "550 No such file or directory."
    );
    assert!(client.command("STOR keep.txt").await.starts_with("150 "));
    data.write_all(b"replaced").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
    assert_eq!(std::fs::read(fixture.path("keep.txt")).unwrap(), b"replaced");
}

#[tokio::test]
async fn test_plaintext_store_is_refused_before_touching_the_file() {
    let fixture = Fixture::start(
        "elrw",
        TlsMode::Implicit,
        vec![TlsRequirement::Data],
        None,
    )
    .await;
    std::fs::write(fixture.path("keep.txt"), b"precious data").unwrap();
    let connector = fixture.connector();
    let mut client = TestClient::connect_implicit(fixture.addr, &connector).await;
    client.login().await;

    let _plain = client.pasv_connect().await;
    assert_eq!(
        client.command("STOR keep.txt").await,
        "522 SSL/TLS required on the data channel."
    );
    assert_eq!(std::fs::read(fixture.path("keep.txt")).unwrap(), b"precious data");
}

#[cfg(unix)]
#[tokio::test]
async fn test_store_through_dangling_symlink_is_refused() {
    let fixture = Fixture::plain("elrw").await;
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("x");
    std::os::unix::fs::symlink(&target, fixture.path("evil")).unwrap();
    let mut client = TestClient::connect(fixture.addr).await;
    client.login().await;

    let _data = client.pasv_connect().await;
    assert_eq!(
        client.command("STOR evil").await,
        "550 Path is outside of the allowed area."
    );
    assert!(!target.exists());
}

#[tokio::test]
async fn test_hangup_during_upload_releases_passive_port() {
    let fixture = Fixture::start("elrw", TlsMode::None, Vec::new(), Some(free_port())).await;
    let mut first = TestClient::connect(fixture.addr).await;
    let mut second = TestClient::connect(fixture.addr).await;
    first.login().await;
    second.login().await;

    let _data = first.pasv_connect().await;
    assert!(first.command("STOR stall.bin").await.starts_with("150 "));
    assert!(second.pasv().await.is_err());

    // The data socket stays open; only the control connection goes away.
    drop(first);
    assert!(pasv_within(&mut second, Duration::from_secs(5)).await.is_ok());
}

#[tokio::test]
async fn test_hangup_while_waiting_for_data_connection_releases_passive_port() {
    let fixture = Fixture::start("elr", TlsMode::None, Vec::new(), Some(free_port())).await;
    std::fs::write(fixture.path("hello.txt"), b"hello").unwrap();
    let mut first = TestClient::connect(fixture.addr).await;
    let mut second = TestClient::connect(fixture.addr).await;
    first.login().await;
    second.login().await;

    first.pasv().await.unwrap();
    assert!(first.command("RETR hello.txt").await.starts_with("150 "));
    assert!(second.pasv().await.is_err());

    drop(first);
    assert!(pasv_within(&mut second, Duration::from_secs(5)).await.is_ok());
}
