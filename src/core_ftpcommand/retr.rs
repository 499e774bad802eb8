use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{open_data_connection, require_argument, resolve_path};
use crate::core_network::control::ControlConnection;
use log::{error, info};
use tokio::fs::File;
use tokio::io::BufReader;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is opened before the data channel is consumed, so a missing
/// file leaves the pending PASV/PORT in place. Bytes are sent unchanged.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The name of the file to retrieve.
///
/// # Returns
///
/// Result<(), CommandError> indicating the success or failure of the operation.
pub async fn handle_retr_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let (virtual_path, file_path) = resolve_path(conn, require_argument(&arg)?).await?;

    let file = File::open(&file_path).await.map_err(|e| {
        error!("File not found or could not be opened: {:?}, error: {}", file_path, e);
        file_error(e)
    })?;
    let metadata = file.metadata().await.map_err(file_error)?;
    if metadata.is_dir() {
        return Err(CommandError::FileAction("Is a directory.".to_string()));
    }

    let mut data = open_data_connection(
        conn,
        &format!("{} ({} bytes)", virtual_path, metadata.len()),
    )
    .await?;
    info!("Sending file: {:?}", file_path);

    let mut reader = BufReader::with_capacity(TRANSFER_BUFFER_SIZE, file);
    let sent = conn
        .guard_transfer(async move {
            let sent = tokio::io::copy_buf(&mut reader, &mut data.stream)
                .await
                .map_err(|e| {
                    error!("Error sending file to client: {}", e);
                    CommandError::TransferAborted(e)
                })?;
            data.close().await.map_err(CommandError::TransferAborted)?;
            Ok::<_, CommandError>(sent)
        })
        .await?;

    info!("File transfer completed successfully: {:?} ({} bytes)", file_path, sent);
    conn.reply(226, "Transfer complete.").await?;
    Ok(())
}
