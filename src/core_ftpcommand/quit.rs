use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use log::info;

/// Handles the QUIT FTP command.
///
/// Closes the session, releasing any pending data channel, before saying
/// goodbye; the control loop then stops reading.
pub async fn handle_quit_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    info!("Received QUIT command. Closing connection.");
    conn.session.close();
    conn.reply(221, "Goodbye.").await?;
    Ok(())
}
