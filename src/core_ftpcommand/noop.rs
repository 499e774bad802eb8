use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;

pub async fn handle_noop_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    conn.reply(200, "I successfully done nothin'.").await?;
    Ok(())
}
