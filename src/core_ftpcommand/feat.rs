use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::core_tls::TlsMode;
use log::info;

/// Features advertised by FEAT, in the order they are listed.
pub fn features(mode: TlsMode) -> Vec<&'static str> {
    let mut features = Vec::new();
    if mode == TlsMode::Explicit {
        features.extend(["AUTH SSL", "AUTH TLS"]);
    }
    features.extend(["EPSV", "MDTM", "PASV"]);
    if mode != TlsMode::None {
        features.extend(["PBSZ", "PROT"]);
    }
    features.extend(["SIZE", "UTF8"]);
    features
}

/// Handles the FEAT (Feature) FTP command.
///
/// # Arguments
///
/// * `conn` - The control connection the command arrived on.
/// * `_arg` - Unused.
///
/// # Returns
///
/// Result<(), CommandError> indicating the success or failure of the operation.
pub async fn handle_feat_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    let lines: Vec<String> = features(conn.context.tls_policy.mode)
        .into_iter()
        .map(|feature| format!(" {}", feature))
        .collect();

    info!("Responding to FEAT command with supported features.");
    conn.reply_multiline(211, "Features supported:", &lines, "End FEAT.")
        .await?;
    Ok(())
}

/// Handles OPTS. Only `UTF8 ON` is understood, and it is a no-op.
pub async fn handle_opts_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let upper = arg.to_ascii_uppercase();
    match upper.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["UTF8"] | ["UTF8", "ON"] => {
            conn.reply(200, "Always in UTF8 mode.").await?;
            Ok(())
        }
        _ => Err(CommandError::Argument("Invalid argument.".to_string())),
    }
}
