use crate::config::PassivePortRange;
use crate::core_tls::{TlsMode, TlsRequirement};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "fixtureftpd",
    about = "A single-user FTP/FTPS server for testing FTP clients."
)]
pub struct Cli {
    /// Name of the single user allowed to log in
    pub username: Option<String>,

    /// Password of that user
    pub password: Option<String>,

    /// Directory the user is rooted at
    pub root: Option<PathBuf>,

    /// Permission string, e.g. "elr" (read only) or "elradfmw" (read/write)
    #[arg(long)]
    pub permissions: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub hostname: Option<String>,

    /// Control port (0 picks an ephemeral port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Passive port range, e.g. "2000-2001"
    #[arg(long)]
    pub passive_ports: Option<PassivePortRange>,

    /// TLS mode
    #[arg(long, value_enum)]
    pub tls: Option<TlsMode>,

    /// Channels on which TLS is mandatory
    #[arg(long, value_enum, num_args = 0..)]
    pub tls_require: Option<Vec<TlsRequirement>>,

    /// PEM certificate used for TLS
    #[arg(long)]
    pub cert_file: Option<PathBuf>,

    /// PEM private key used for TLS
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Generate a self-signed certificate in this directory if none exists
    #[arg(long)]
    pub gen_certs_dir: Option<PathBuf>,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}
