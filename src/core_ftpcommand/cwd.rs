use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::{quote_path, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{info, warn};

/// Handles the CWD FTP command, and CDUP through it.
pub async fn handle_cwd_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let target = if arg.is_empty() { "/" } else { arg.as_str() };
    let (virtual_path, real_path) = resolve_path(conn, target).await?;

    match tokio::fs::metadata(&real_path).await {
        Ok(metadata) if metadata.is_dir() => {
            info!("Changed directory to {}", virtual_path);
            let response = format!("{} is the current directory.", quote_path(&virtual_path));
            conn.session.current_dir = virtual_path;
            conn.reply(250, &response).await?;
            Ok(())
        }
        _ => {
            warn!("Failed to change directory to {:?}", real_path);
            Err(CommandError::FileAction("No such directory.".to_string()))
        }
    }
}
