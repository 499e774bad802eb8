use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{error, info};

/// Handles the RNTO (Rename To) FTP command.
pub async fn handle_rnto_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let arg = require_argument(&arg)?;
    let from = conn
        .session
        .rename_from
        .take()
        .ok_or_else(|| CommandError::BadSequence("Bad sequence of commands: use RNFR first.".to_string()))?;
    let (_, to) = resolve_path(conn, arg).await?;

    if let Err(e) = tokio::fs::rename(&from, &to).await {
        error!("Failed to rename {:?} to {:?}: {}", from, to, e);
        return Err(file_error(e));
    }

    info!("Renamed {:?} to {:?}", from, to);
    conn.reply(250, "Renaming ok.").await?;
    Ok(())
}
