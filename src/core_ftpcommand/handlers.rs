use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::ftpcommand::{parse_command_line, FtpCommand};
use crate::core_ftpcommand::{
    auth, cdup, cwd, dele, feat, list, mdtm, mkd, noop, pass, prot, pwd, quit, retr, rmd, rnfr,
    rnto, size, stor, syst, type_, user,
};
use crate::core_network::control::ControlConnection;
use crate::core_network::{pasv, port};
use log::{debug, error, info, warn};

/// Parses one control line, runs it and answers the client.
///
/// Only fatal errors are returned; every other failure is turned into a
/// reply here and leaves the session as it was.
pub async fn dispatch(conn: &mut ControlConnection, line: &str) -> Result<(), CommandError> {
    let result = match parse_command_line(line) {
        Ok((command, arg)) => {
            if command == FtpCommand::PASS {
                info!("[{}] Received command: PASS ******", conn.peer_addr());
            } else {
                info!("[{}] Received command: {}", conn.peer_addr(), line);
            }
            execute(conn, command, arg).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => {
            error!("[{}] {}", conn.peer_addr(), e);
            Err(e)
        }
        Err(e) => {
            warn!("[{}] {}", conn.peer_addr(), e);
            conn.send_line(&e.to_ftp_response()).await?;
            Ok(())
        }
    }
}

async fn execute(
    conn: &mut ControlConnection,
    command: FtpCommand,
    arg: String,
) -> Result<(), CommandError> {
    if command.requires_login() && !conn.session.is_authenticated() {
        return Err(CommandError::NotLoggedIn);
    }

    if let Some(permission) = command.required_permission() {
        let username = conn.session.username().unwrap_or_default();
        if !conn.context.authorizer.has_perm(username, permission) {
            return Err(CommandError::PermissionDenied(permission));
        }
    }

    debug!(
        "[{}] Executing {:?} in state {:?}/{:?}",
        conn.peer_addr(),
        command,
        conn.session.state(),
        conn.session.tls_state()
    );

    match command {
        FtpCommand::USER => user::handle_user_command(conn, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(conn, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(conn, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(conn, arg).await,
        FtpCommand::SYST => syst::handle_syst_command(conn, arg).await,
        FtpCommand::FEAT => feat::handle_feat_command(conn, arg).await,
        FtpCommand::OPTS => feat::handle_opts_command(conn, arg).await,
        FtpCommand::TYPE => type_::handle_type_command(conn, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(conn, arg).await,
        FtpCommand::CWD => cwd::handle_cwd_command(conn, arg).await,
        FtpCommand::CDUP => cdup::handle_cdup_command(conn, arg).await,
        FtpCommand::LIST => list::handle_list_command(conn, arg).await,
        FtpCommand::NLST => list::handle_nlst_command(conn, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(conn, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(conn, arg).await,
        FtpCommand::APPE => stor::handle_appe_command(conn, arg).await,
        FtpCommand::DELE => dele::handle_dele_command(conn, arg).await,
        FtpCommand::MKD => mkd::handle_mkd_command(conn, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(conn, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(conn, arg).await,
        FtpCommand::RNTO => rnto::handle_rnto_command(conn, arg).await,
        FtpCommand::SIZE => size::handle_size_command(conn, arg).await,
        FtpCommand::MDTM => mdtm::handle_mdtm_command(conn, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(conn, arg).await,
        FtpCommand::EPSV => pasv::handle_epsv_command(conn, arg).await,
        FtpCommand::PORT => port::handle_port_command(conn, arg).await,
        FtpCommand::AUTH => auth::handle_auth_command(conn, arg).await,
        FtpCommand::PBSZ => prot::handle_pbsz_command(conn, arg).await,
        FtpCommand::PROT => prot::handle_prot_command(conn, arg).await,
    }
}
