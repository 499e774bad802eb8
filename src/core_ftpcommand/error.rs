// Errors raised while executing one FTP command
use crate::core_auth::Permission;
use crate::core_network::error::DataChannelError;
use crate::core_tls::TlsError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Control,
    Data,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Control => write!(f, "control"),
            Channel::Data => write!(f, "data"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Authentication failed for user {0:?}")]
    AuthenticationFailure(String),

    #[error("Command requires a logged in user")]
    NotLoggedIn,

    #[error("Permission '{}' denied", .0.symbol())]
    PermissionDenied(Permission),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    #[error("Bad argument: {0}")]
    Argument(String),

    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    #[error("Unsupported protection level {0:?}")]
    UnsupportedProtection(String),

    #[error("Bad sequence of commands: {0}")]
    BadSequence(String),

    #[error("No data channel set up")]
    NoDataChannel,

    #[error(transparent)]
    DataChannel(#[from] DataChannelError),

    #[error("TLS required on the {0} channel")]
    TlsRequired(Channel),

    #[error("AUTH received on an implicit TLS connection")]
    ImplicitTlsAuth,

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("File action failed: {0}")]
    FileAction(String),

    #[error("Transfer aborted: {0}")]
    TransferAborted(#[source] std::io::Error),

    #[error("Control connection closed during a transfer")]
    ControlClosed,

    #[error("Control connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Errors that end the session instead of being answered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CommandError::Io(_)
                | CommandError::ControlClosed
                | CommandError::Tls(TlsError::TlsHandshakeError(_))
        )
    }

    pub fn to_ftp_response(&self) -> String {
        match self {
            CommandError::AuthenticationFailure(_) => "530 Authentication failed.".to_string(),
            CommandError::NotLoggedIn => "530 Log in with USER and PASS first.".to_string(),
            CommandError::PermissionDenied(_) => "550 Not enough privileges.".to_string(),
            CommandError::Syntax(msg) => format!("500 {}", msg),
            CommandError::UnknownCommand(cmd) => format!("500 Command \"{}\" not understood.", cmd),
            CommandError::Argument(msg) => format!("501 {}", msg),
            CommandError::UnsupportedParameter(msg) => format!("504 {}", msg),
            CommandError::UnsupportedProtection(level) => {
                format!("536 PROT {} unsupported (use C or P).", level)
            }
            CommandError::BadSequence(msg) => format!("503 {}", msg),
            CommandError::NoDataChannel => "425 Use PORT or PASV first.".to_string(),
            CommandError::DataChannel(e) => e.to_ftp_response(),
            CommandError::TlsRequired(Channel::Control) => {
                "550 SSL/TLS required on the control channel.".to_string()
            }
            CommandError::TlsRequired(Channel::Data) => {
                "522 SSL/TLS required on the data channel.".to_string()
            }
            CommandError::ImplicitTlsAuth => {
                "550 not supposed to be used with implicit SSL.".to_string()
            }
            CommandError::Tls(e) => e.to_ftp_response(),
            CommandError::FileAction(msg) => format!("550 {}", msg),
            CommandError::TransferAborted(_) | CommandError::ControlClosed => {
                "426 Connection closed; transfer aborted.".to_string()
            }
            CommandError::Io(_) => {
                "451 Requested action aborted. Local error in processing.".to_string()
            }
        }
    }
}

/// Maps a file system error to a 550 reply.
pub fn file_error(e: std::io::Error) -> CommandError {
    let reason = match e.kind() {
        std::io::ErrorKind::NotFound => "No such file or directory.".to_string(),
        std::io::ErrorKind::PermissionDenied => "Permission denied.".to_string(),
        std::io::ErrorKind::AlreadyExists => "File exists.".to_string(),
        _ => format!("{}.", e),
    };
    CommandError::FileAction(reason)
}
