use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;

/// Handles the SIZE FTP command: the exact size in bytes of a regular file.
pub async fn handle_size_command(
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

    conn.reply(213, &metadata.len().to_string()).await?;
    Ok(())
}
