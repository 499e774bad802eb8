use crate::core_ftpcommand::cwd::handle_cwd_command;
use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;

pub async fn handle_cdup_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    handle_cwd_command(conn, "..".to_string()).await
}
