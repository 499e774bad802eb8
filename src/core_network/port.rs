use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::core_network::data_channel::DataChannel;
use log::{info, warn};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Parses the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub fn parse_port_argument(arg: &str) -> Result<SocketAddrV4, CommandError> {
    let invalid = || CommandError::Argument("Invalid PORT format.".to_string());

    let bytes = arg
        .trim()
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| invalid())?;

    match bytes.as_slice() {
        [h1, h2, h3, h4, p1, p2] => Ok(SocketAddrV4::new(
            Ipv4Addr::new(*h1, *h2, *h3, *h4),
            u16::from(*p1) << 8 | u16::from(*p2),
        )),
        _ => Err(invalid()),
    }
}

/// Handles the PORT (Active Mode) FTP command.
///
/// Only records the endpoint; the connection is made by the next transfer
/// command. The endpoint must be the client's own address on an
/// unprivileged port, so the server cannot be used to bounce connections.
pub async fn handle_port_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let addr = parse_port_argument(&arg)?;

    if addr.port() < 1024 {
        warn!("Rejected PORT to privileged port {}", addr.port());
        return Err(CommandError::Argument(
            "Can't connect over a privileged port.".to_string(),
        ));
    }

    if std::net::IpAddr::V4(*addr.ip()) != conn.peer_addr().ip().to_canonical() {
        warn!(
            "Rejected PORT to foreign address {} (client is {})",
            addr,
            conn.peer_addr()
        );
        return Err(CommandError::Argument(
            "Rejected data connection to foreign address.".to_string(),
        ));
    }

    drop(conn.session.take_data_channel());
    let tls_required = conn.session.data_protected();
    conn.session
        .set_data_channel(DataChannel::active(SocketAddr::V4(addr), tls_required));

    info!("Active data endpoint set to {}", addr);
    conn.reply(200, "Active data connection accepted.").await?;
    Ok(())
}
