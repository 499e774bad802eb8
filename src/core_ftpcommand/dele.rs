use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{error, info};
use tokio::fs;

/// Handles the DELE FTP command.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The file to delete.
pub async fn handle_dele_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (_, file_path) = resolve_path(conn, require_argument(&arg)?).await?;

    if file_path.is_dir() {
        return Err(CommandError::FileAction("Is a directory.".to_string()));
    }

    match fs::remove_file(&file_path).await {
        Ok(()) => {
            info!("File deleted: {:?}", file_path);
            conn.reply(250, "File removed.").await?;
            Ok(())
        }
        Err(e) => {
            error!("Failed to delete file {:?}: {}", file_path, e);
            Err(file_error(e))
        }
    }
}
