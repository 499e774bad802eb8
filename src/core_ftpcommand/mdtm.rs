use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Formats a modification time as the `YYYYMMDDHHMMSS` UTC stamp of RFC 3659.
pub fn format_mdtm(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified)
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// Handles the MDTM FTP command.
pub async fn handle_mdtm_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (virtual_path, path) = resolve_path(conn, require_argument(&arg)?).await?;
    let metadata = tokio::fs::metadata(&path).await.map_err(file_error)?;

    if !metadata.is_file() {
        return Err(CommandError::FileAction(format!(
            "\"{}\" is not retrievable.",
            virtual_path
        )));
    }

    let modified = metadata.modified().map_err(file_error)?;
    conn.reply(213, &format_mdtm(modified)).await?;
    Ok(())
}
