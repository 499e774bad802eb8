use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use log::info;

/// Handles the SYST (System) FTP command.
///
/// Clients use the answer to pick a LIST parser, so we always claim UNIX.
pub async fn handle_syst_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    info!("Responding to SYST command with system type.");
    conn.reply(215, "UNIX Type: L8").await?;
    Ok(())
}
