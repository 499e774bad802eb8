use crate::core_auth::UserRecord;
use crate::core_network::data_channel::DataChannel;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    AwaitingDataConnection,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsState {
    Plaintext,
    ControlSecured,
    ControlAndDataSecured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    #[default]
    Ascii,
    Binary,
}

/// Per-connection protocol state, owned by the task serving the connection.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    tls_state: TlsState,
    pending_username: Option<String>,
    user: Option<Arc<UserRecord>>,
    pbsz_received: bool,
    data_channel: Option<DataChannel>,
    pub current_dir: String,          // Virtual path, always absolute
    pub rename_from: Option<PathBuf>, // Set by RNFR, consumed by RNTO
    pub transfer_type: TransferType,
}

impl Session {
    pub fn new(tls_state: TlsState) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            tls_state,
            pending_username: None,
            user: None,
            pbsz_received: false,
            data_channel: None,
            current_dir: String::from("/"),
            rename_from: None,
            transfer_type: TransferType::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tls_state(&self) -> TlsState {
        self.tls_state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::AwaitingDataConnection
        )
    }

    pub fn user(&self) -> Option<&Arc<UserRecord>> {
        self.user.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.get_username())
    }

    pub fn set_pending_username(&mut self, username: String) {
        self.pending_username = Some(username);
    }

    pub fn pending_username(&self) -> Option<&str> {
        self.pending_username.as_deref()
    }

    pub fn login(&mut self, user: Arc<UserRecord>) {
        debug!("Session authenticated as {}", user.get_username());
        self.user = Some(user);
        self.pending_username = None;
        self.current_dir = String::from("/");
        self.state = SessionState::Authenticated;
    }

    /// Forgets the authenticated user along with anything tied to it.
    pub fn logout(&mut self) {
        self.user = None;
        self.pending_username = None;
        self.rename_from = None;
        self.data_channel = None;
        self.current_dir = String::from("/");
        self.state = SessionState::Unauthenticated;
    }

    pub fn secure_control(&mut self) {
        if self.tls_state == TlsState::Plaintext {
            self.tls_state = TlsState::ControlSecured;
        }
    }

    pub fn control_secured(&self) -> bool {
        self.tls_state != TlsState::Plaintext
    }

    pub fn set_pbsz_received(&mut self) {
        self.pbsz_received = true;
    }

    pub fn pbsz_received(&self) -> bool {
        self.pbsz_received
    }

    /// Applies PROT P (`private == true`) or PROT C, including to a data
    /// channel that is already pending.
    pub fn set_data_protection(&mut self, private: bool) {
        self.tls_state = if private {
            TlsState::ControlAndDataSecured
        } else {
            TlsState::ControlSecured
        };
        if let Some(channel) = self.data_channel.as_mut() {
            channel.set_tls_required(private);
        }
    }

    pub fn data_protected(&self) -> bool {
        self.tls_state == TlsState::ControlAndDataSecured
    }

    /// Stores a new pending data channel, dropping (and releasing) any previous one.
    pub fn set_data_channel(&mut self, channel: DataChannel) {
        self.data_channel = Some(channel);
        self.state = SessionState::AwaitingDataConnection;
    }

    pub fn has_data_channel(&self) -> bool {
        self.data_channel.is_some()
    }

    pub fn take_data_channel(&mut self) -> Option<DataChannel> {
        let channel = self.data_channel.take();
        if self.state == SessionState::AwaitingDataConnection {
            self.state = SessionState::Authenticated;
        }
        channel
    }

    pub fn close(&mut self) {
        self.data_channel = None;
        self.state = SessionState::Closed;
    }
}
