use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::session::TransferType;

/// Handles the TYPE FTP command.
///
/// Accepts ASCII (`A`, `A N`) and binary (`I`, `L 8`). The type is recorded
/// and reported, transfers themselves always copy bytes unchanged.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `arg` - The argument specifying the transfer type.
pub async fn handle_type_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let normalized: String = arg
        .to_ascii_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("");

    let transfer_type = match normalized.as_str() {
        "A" | "AN" => TransferType::Ascii,
        "I" | "L8" => TransferType::Binary,
        _ => {
            return Err(CommandError::UnsupportedParameter(format!(
                "Unsupported type \"{}\".",
                arg
            )))
        }
    };

    conn.session.transfer_type = transfer_type;
    let name = match transfer_type {
        TransferType::Ascii => "ASCII",
        TransferType::Binary => "Binary",
    };
    conn.reply(200, &format!("Type set to: {}.", name)).await?;
    Ok(())
}
