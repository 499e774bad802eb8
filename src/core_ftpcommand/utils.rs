use crate::core_ftpcommand::error::{Channel, CommandError};
use crate::core_network::control::ControlConnection;
use crate::core_network::data_channel::{DataChannel, DataChannelMode, DataConnection};
use crate::session::TransferType;
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Resolves `arg` against the virtual directory `current_dir`.
///
/// The result is always absolute and normalized. `..` stops at the virtual
/// root, so no argument can climb above the user's root directory.
pub fn resolve_virtual_path(current_dir: &str, arg: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    let start = if arg.starts_with('/') { "" } else { current_dir };

    for part in start.split('/').chain(arg.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            name => components.push(name),
        }
    }

    format!("/{}", components.join("/"))
}

/// Maps a normalized virtual path onto the file system under `root`.
pub fn to_real_path(root: &Path, virtual_path: &str) -> PathBuf {
    let relative = virtual_path.trim_start_matches('/');
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

// Symlinks inside the root may still point out of it. A dangling link is
// refused outright, since creating through it would follow the target.
async fn ensure_within_root(root: &Path, path: &Path) -> Result<(), CommandError> {
    let resolved = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => {
            let resolved = fs::canonicalize(path).await.map_err(|e| {
                error!("Dangling symlink {:?}: {}", path, e);
                outside_root()
            })?;
            Ok(resolved)
        }
        Ok(_) => fs::canonicalize(path).await,
        Err(_) => fs::canonicalize(path.parent().unwrap_or(root)).await,
    }
    .unwrap_or_else(|_| root.to_path_buf());

    if resolved.starts_with(root) {
        Ok(())
    } else {
        error!("Path is outside of the allowed area: {:?}", resolved);
        Err(outside_root())
    }
}

fn outside_root() -> CommandError {
    CommandError::FileAction("Path is outside of the allowed area.".to_string())
}

pub fn user_root(conn: &ControlConnection) -> Result<PathBuf, CommandError> {
    conn.session
        .user()
        .map(|user| user.get_root().clone())
        .ok_or(CommandError::NotLoggedIn)
}

/// Resolves a command argument to its virtual path and its real path.
pub async fn resolve_path(
    conn: &ControlConnection,
    arg: &str,
) -> Result<(String, PathBuf), CommandError> {
    let root = user_root(conn)?;
    let virtual_path = resolve_virtual_path(&conn.session.current_dir, arg);
    let real_path = to_real_path(&root, &virtual_path);
    ensure_within_root(&root, &real_path).await?;
    debug!("Resolved {:?} to {:?}", arg, real_path);
    Ok((virtual_path, real_path))
}

pub fn require_argument(arg: &str) -> Result<&str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Argument(
            "Syntax error: command needs an argument.".to_string(),
        ))
    } else {
        Ok(arg)
    }
}

/// Quotes a path the way 257 replies do, doubling embedded quotes.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

/// Takes the pending data channel for a transfer.
///
/// Refuses with 425 when there is none, and with 522 (discarding the
/// descriptor) when TLS is mandatory on data connections and the client has
/// not asked for PROT P.
pub fn claim_data_channel(conn: &mut ControlConnection) -> Result<DataChannel, CommandError> {
    let channel = conn
        .session
        .take_data_channel()
        .ok_or(CommandError::NoDataChannel)?;

    if conn.context.tls_policy.data_required && !channel.tls_required() {
        return Err(CommandError::TlsRequired(Channel::Data));
    }
    Ok(channel)
}

/// Sends the 150 preliminary reply and connects a claimed data channel,
/// giving up if the control connection goes away first.
pub async fn connect_data_channel(
    conn: &mut ControlConnection,
    channel: DataChannel,
    what: &str,
) -> Result<DataConnection, CommandError> {
    match channel.mode() {
        DataChannelMode::Passive { listener, .. } => {
            debug!("Waiting for passive data connection on {:?}", listener.local_addr())
        }
        DataChannelMode::Active { addr } => debug!("Opening active data connection to {}", addr),
    }

    let mode = match conn.session.transfer_type {
        TransferType::Ascii => "ASCII",
        TransferType::Binary => "BINARY",
    };
    conn.reply(150, &format!("Opening {} mode data connection for {}.", mode, what))
        .await?;

    let context = Arc::clone(&conn.context);
    conn.guard_transfer(async move {
        let data = channel.establish(context.tls.as_ref()).await?;
        Ok::<_, CommandError>(data)
    })
    .await
}

/// Claims the pending data channel and connects it.
pub async fn open_data_connection(
    conn: &mut ControlConnection,
    what: &str,
) -> Result<DataConnection, CommandError> {
    let channel = claim_data_channel(conn)?;
    connect_data_channel(conn, channel, what).await
}
