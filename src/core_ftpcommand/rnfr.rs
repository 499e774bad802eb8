use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::{require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{info, warn};

/// Handles the RNFR (Rename From) FTP command.
///
/// Remembers the source path; the next RNTO consumes it.
pub async fn handle_rnfr_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (virtual_path, path) = resolve_path(conn, require_argument(&arg)?).await?;

    if virtual_path == "/" {
        return Err(CommandError::FileAction(
            "Can't rename home directory.".to_string(),
        ));
    }

    if tokio::fs::symlink_metadata(&path).await.is_err() {
        warn!("RNFR source does not exist: {:?}", path);
        return Err(CommandError::FileAction(
            "No such file or directory.".to_string(),
        ));
    }

    info!("Rename source set to {:?}", path);
    conn.session.rename_from = Some(path);
    conn.reply(350, "Ready for destination name.").await?;
    Ok(())
}
