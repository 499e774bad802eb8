use crate::core_ftpcommand::error::{Channel, CommandError};
use crate::core_network::control::ControlConnection;
use log::{info, warn};

/// Handles the PASS FTP command.
///
/// Checks the password against the authorizer for the name given with USER.
/// A failed attempt forgets that name; the client starts over with USER.
pub async fn handle_pass_command(
    conn: &mut ControlConnection,
    password: String,
) -> Result<(), CommandError> {
    if conn.context.tls_policy.control_required && !conn.session.control_secured() {
        return Err(CommandError::TlsRequired(Channel::Control));
    }

    if conn.session.is_authenticated() {
        return Err(CommandError::BadSequence(
            "User already authenticated.".to_string(),
        ));
    }

    let username = conn
        .session
        .pending_username()
        .ok_or_else(|| CommandError::BadSequence("Login with USER first.".to_string()))?
        .to_string();

    let user = if conn.context.authorizer.check(&username, &password) {
        conn.context.authorizer.lookup(&username)
    } else {
        None
    };

    match user {
        Some(user) => {
            info!(
                "User {} logged in with permissions \"{}\"",
                username,
                user.get_permissions()
            );
            conn.session.login(user);
            conn.reply(230, "Login successful.").await?;
            Ok(())
        }
        None => {
            warn!("Authentication failed for user {}", username);
            conn.session.logout();
            Err(CommandError::AuthenticationFailure(username))
        }
    }
}
