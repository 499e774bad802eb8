use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::core_tls::{TlsError, TlsMode};
use log::info;

/// Handles the AUTH FTP command (RFC 4217).
///
/// Only explicit TLS servers upgrade. The 234 reply goes out in plaintext,
/// then the handshake runs on the same socket. A failed handshake is fatal
/// for the session.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The security mechanism: TLS, TLS-C, SSL or TLS-P.
///
/// # Returns
///
/// Result<(), CommandError> indicating the success or failure of the operation.
pub async fn handle_auth_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    match conn.context.tls_policy.mode {
        TlsMode::Implicit => return Err(CommandError::ImplicitTlsAuth),
        TlsMode::None => return Err(TlsError::TlsNotConfigured.into()),
        TlsMode::Explicit => {}
    }

    if conn.session.control_secured() {
        return Err(CommandError::BadSequence("Already using TLS.".to_string()));
    }

    let mechanism = arg.trim().to_ascii_uppercase();
    if !matches!(mechanism.as_str(), "TLS" | "TLS-C" | "SSL" | "TLS-P") {
        return Err(CommandError::UnsupportedParameter(
            "Unrecognized encryption type (use TLS or SSL).".to_string(),
        ));
    }

    if conn.has_buffered_input() {
        return Err(CommandError::BadSequence(
            "Commands may not be pipelined after AUTH.".to_string(),
        ));
    }

    let tls = conn.context.tls.clone().ok_or(TlsError::TlsNotConfigured)?;
    conn.reply(234, &format!("AUTH {} successful.", mechanism)).await?;
    conn.upgrade_to_tls(&tls).await?;

    info!("[{}] Control connection secured with TLS", conn.peer_addr());
    Ok(())
}
