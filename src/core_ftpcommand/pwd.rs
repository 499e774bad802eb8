use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::quote_path;
use crate::core_network::control::ControlConnection;

pub async fn handle_pwd_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    let response = format!("{} is the current directory.", quote_path(&conn.session.current_dir));
    conn.reply(257, &response).await?;
    Ok(())
}
