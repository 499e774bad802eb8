use crate::core_ftpcommand::error::{Channel, CommandError};
use crate::core_ftpcommand::utils::require_argument;
use crate::core_network::control::ControlConnection;
use log::info;

/// Handles the USER FTP command.
///
/// Stores the name until PASS arrives. Issuing USER while logged in first
/// logs the session out, so the next PASS authenticates from scratch.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The username provided by the client.
///
/// # Returns
///
/// Result<(), CommandError> indicating the success or failure of the operation.
pub async fn handle_user_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let username = require_argument(&arg)?;

    if conn.context.tls_policy.control_required && !conn.session.control_secured() {
        return Err(CommandError::TlsRequired(Channel::Control));
    }

    if conn.session.is_authenticated() {
        info!("USER received while logged in, logging out {:?}", conn.session.username());
        conn.session.logout();
        conn.session.set_pending_username(username.to_string());
        conn.reply(331, "Previous account information was flushed, send password.")
            .await?;
    } else {
        info!("Username received: {}", username);
        conn.session.set_pending_username(username.to_string());
        conn.reply(331, "Username ok, send password.").await?;
    }

    Ok(())
}
