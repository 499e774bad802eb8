use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{quote_path, require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{error, info};
use tokio::fs;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory; missing parents are not created.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The directory to create, relative to the current directory or absolute.
///
/// # Returns
///
/// Result<(), CommandError> indicating the success or failure of the operation.
pub async fn handle_mkd_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (virtual_path, dir_path) = resolve_path(conn, require_argument(&arg)?).await?;
    info!("Constructed directory path: {:?}", dir_path);

    if let Err(e) = fs::create_dir(&dir_path).await {
        error!("Failed to create directory: {:?}, error: {}", dir_path, e);
        return Err(file_error(e));
    }

    info!("Directory created successfully: {:?}", dir_path);
    conn.reply(257, &format!("{} directory created.", quote_path(&virtual_path)))
        .await?;
    Ok(())
}
