use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{error, info};
use tokio::fs;

/// Handles the RMD (Remove Directory) FTP command.
pub async fn handle_rmd_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (virtual_path, dir_path) = resolve_path(conn, require_argument(&arg)?).await?;

    if virtual_path == "/" {
        return Err(CommandError::FileAction(
            "Can't remove root directory.".to_string(),
        ));
    }

    // Empty directories only, like rmdir(2).
    if let Err(e) = fs::remove_dir(&dir_path).await {
        error!("Failed to remove directory {:?}: {}", dir_path, e);
        return Err(file_error(e));
    }

    info!("Directory removed: {:?}", dir_path);
    conn.reply(250, "Directory removed.").await?;
    Ok(())
}
