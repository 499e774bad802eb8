use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::core_tls::{TlsError, TlsMode};
use log::info;

fn ensure_secure_control(conn: &ControlConnection, command: &str) -> Result<(), CommandError> {
    if conn.context.tls_policy.mode == TlsMode::None {
        return Err(TlsError::TlsNotConfigured.into());
    }
    if !conn.session.control_secured() {
        return Err(CommandError::BadSequence(format!(
            "{} not allowed on insecure control connection.",
            command
        )));
    }
    Ok(())
}

/// Handles PBSZ. Only a buffer size of 0 makes sense over TLS, so the
/// argument is acknowledged as 0 whatever it was.
pub async fn handle_pbsz_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    ensure_secure_control(conn, "PBSZ")?;
    conn.session.set_pbsz_received();
    conn.reply(200, "PBSZ=0 successful.").await?;
    Ok(())
}

/// Handles PROT. `P` makes every following data connection TLS, `C` makes
/// them plaintext; the setting also applies to an already pending channel.
pub async fn handle_prot_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    ensure_secure_control(conn, "PROT")?;
    if !conn.session.pbsz_received() {
        return Err(CommandError::BadSequence(
            "You must issue the PBSZ command prior to PROT.".to_string(),
        ));
    }

    let level = arg.trim().to_ascii_uppercase();
    match level.as_str() {
        "C" => {
            conn.session.set_data_protection(false);
            conn.reply(200, "Protection set to Clear").await?;
        }
        "P" => {
            conn.session.set_data_protection(true);
            conn.reply(200, "Protection set to Private").await?;
        }
        "S" | "E" => return Err(CommandError::UnsupportedProtection(level)),
        _ => {
            return Err(CommandError::UnsupportedParameter(
                "Unrecognized PROT type (use C or P).".to_string(),
            ))
        }
    }

    info!("[{}] Data protection level set to {}", conn.peer_addr(), level);
    Ok(())
}
