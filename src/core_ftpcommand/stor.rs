use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{
    claim_data_channel, connect_data_channel, require_argument, resolve_path,
};
use crate::core_network::control::ControlConnection;
use log::{debug, error, info};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Handles the STOR (Store File) FTP command, replacing any existing file.
pub async fn handle_stor_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    receive_file(conn, &arg, false).await
}

/// Handles the APPE (Append) FTP command, creating the file if needed.
pub async fn handle_appe_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    receive_file(conn, &arg, true).await
}

async fn receive_file(
    conn: &mut ControlConnection,
    arg: &str,
    append: bool,
) -> Result<(), CommandError> {
    let (virtual_path, file_path) = resolve_path(conn, require_argument(arg)?).await?;
    info!("Receiving file {:?} (append: {})", file_path, append);

    // Nothing on disk changes unless a transfer can actually start.
    let channel = claim_data_channel(conn)?;

    let mut options = OpenOptions::new();
    if append {
        options.append(true).create(true);
    } else {
        options.write(true).create(true).truncate(true);
    }
    let file = match options.open(&file_path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create file: {:?}, error: {}", file_path, e);
            conn.session.set_data_channel(channel);
            return Err(file_error(e));
        }
    };

    let mut data = connect_data_channel(conn, channel, &virtual_path).await?;

    let mut writer = BufWriter::with_capacity(TRANSFER_BUFFER_SIZE, file);
    let received = conn
        .guard_transfer(async move {
            let received = tokio::io::copy(&mut data.stream, &mut writer)
                .await
                .map_err(|e| {
                    error!("Error reading from data stream: {}", e);
                    CommandError::TransferAborted(e)
                })?;
            writer.flush().await.map_err(CommandError::TransferAborted)?;

            // The client has already closed its side; a failed close changes nothing.
            if let Err(e) = data.close().await {
                debug!("Closing data connection after upload failed: {}", e);
            }
            Ok::<_, CommandError>(received)
        })
        .await?;

    info!("File stored successfully: {:?} ({} bytes)", file_path, received);
    conn.reply(226, "Transfer complete.").await?;
    Ok(())
}
