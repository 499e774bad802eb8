use crate::core_ftpcommand::error::CommandError;
use crate::core_network::control::ControlConnection;
use crate::core_network::data_channel::DataChannel;
use crate::core_network::error::DataChannelError;
use crate::core_network::port_pool::PortLease;
use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::TcpListener;

/// Handles the PASV FTP command.
///
/// Only IPv4 control connections can express their address in a 227 reply.
pub async fn handle_pasv_command(
    conn: &mut ControlConnection,
    _arg: String,
) -> Result<(), CommandError> {
    let ip = match conn.local_addr().ip().to_canonical() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(_) => {
            conn.reply(425, "You cannot use PASV on IPv6 connections. Use EPSV instead.")
                .await?;
            return Ok(());
        }
    };

    let port = open_passive_listener(conn).await?;
    conn.reply(227, &format_pasv_reply(ip, port)).await?;
    Ok(())
}

/// Handles the EPSV FTP command (RFC 2428).
pub async fn handle_epsv_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    let protocol = arg.trim();
    if !protocol.is_empty() && protocol != "1" && protocol != "2" {
        conn.reply(522, "Network protocol not supported (use 1 or 2).")
            .await?;
        return Ok(());
    }

    let port = open_passive_listener(conn).await?;
    conn.reply(229, &format_epsv_reply(port)).await?;
    Ok(())
}

/// Binds the listener for the next data connection and stores it in the
/// session, replacing (and releasing) any channel still pending.
///
/// With a configured range the port is leased from the shared pool; a bind
/// failure gives the lease straight back.
async fn open_passive_listener(conn: &mut ControlConnection) -> Result<u16, CommandError> {
    if conn.session.has_data_channel() {
        debug!("Replacing pending data channel");
        drop(conn.session.take_data_channel());
    }

    let ip = conn.local_addr().ip();
    let lease = match &conn.context.passive_pool {
        Some(pool) => {
            let lease = pool.lease().map_err(DataChannelError::from)?;
            debug!(
                "Passive ports in use: {} of {:?}",
                pool.leased_count(),
                pool.range()
            );
            Some(lease)
        }
        None => None,
    };
    let port = lease.as_ref().map(PortLease::port).unwrap_or(0);

    let listener = match TcpListener::bind((ip, port)).await {
        Ok(listener) => listener,
        Err(source) => {
            warn!("Failed to bind passive port {}: {}", port, source);
            if let Some(lease) = lease {
                lease.release();
            }
            return Err(DataChannelError::Bind { port, source }.into());
        }
    };
    let port = listener
        .local_addr()
        .map_err(|source| DataChannelError::Bind { port, source })?
        .port();

    let tls_required = conn.session.data_protected();
    let peer_ip = conn.peer_addr().ip();
    conn.session
        .set_data_channel(DataChannel::passive(listener, lease, peer_ip, tls_required));

    info!("Passive listener set up on {}:{}", ip, port);
    Ok(port)
}

/// The text of a 227 reply: address and port as six decimal bytes.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "Entering passive mode ({},{},{},{},{},{}).",
        h1,
        h2,
        h3,
        h4,
        port >> 8,
        port & 0xff
    )
}

pub fn format_epsv_reply(port: u16) -> String {
    format!("Entering extended passive mode (|||{}|).", port)
}
