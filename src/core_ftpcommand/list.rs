use crate::core_ftpcommand::error::{file_error, CommandError};
use crate::core_ftpcommand::utils::{open_data_connection, resolve_path};
use crate::core_network::control::ControlConnection;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::fs::Metadata;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Handles the LIST FTP command with `ls -l` style lines.
pub async fn handle_list_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    send_listing(conn, &arg, true).await
}

/// Handles the NLST FTP command: bare names, one per line.
pub async fn handle_nlst_command(
    conn: &mut ControlConnection,
    arg: String,
) -> Result<(), CommandError> {
    send_listing(conn, &arg, false).await
}

async fn send_listing(
    conn: &mut ControlConnection,
    arg: &str,
    long: bool,
) -> Result<(), CommandError> {
    let (virtual_path, path) = resolve_path(conn, strip_list_options(arg)).await?;
    let metadata = fs::metadata(&path).await.map_err(file_error)?;

    let entries = if metadata.is_dir() {
        read_entries(&path).await.map_err(file_error)?
    } else {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec![(name, metadata)]
    };

    let now = Utc::now();
    let listing: String = entries
        .iter()
        .map(|(name, metadata)| {
            if long {
                format_list_entry(name, metadata, now)
            } else {
                format!("{}\r\n", name)
            }
        })
        .collect();

    let mut data = open_data_connection(conn, "file list").await?;
    conn.guard_transfer(async move {
        data.stream
            .write_all(listing.as_bytes())
            .await
            .map_err(CommandError::TransferAborted)?;
        data.close().await.map_err(CommandError::TransferAborted)
    })
    .await?;

    info!("Listed {} entries of {}", entries.len(), virtual_path);
    conn.reply(226, "Transfer complete.").await?;
    Ok(())
}

/// Drops leading `ls` style flags such as `-la`, which many clients send.
pub fn strip_list_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = rest
            .split_once(' ')
            .map(|(_, tail)| tail.trim_start())
            .unwrap_or("");
    }
    rest
}

async fn read_entries(dir: &Path) -> std::io::Result<Vec<(String, Metadata)>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        match entry.metadata().await {
            Ok(metadata) => {
                entries.push((entry.file_name().to_string_lossy().into_owned(), metadata))
            }
            Err(e) => warn!("Skipping {:?} in listing: {}", entry.path(), e),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

#[cfg(unix)]
fn mode_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = metadata.permissions().mode();
    "rwxrwxrwx"
        .chars()
        .enumerate()
        .map(|(i, c)| if mode & (0o400 >> i) != 0 { c } else { '-' })
        .collect()
}

#[cfg(not(unix))]
fn mode_string(metadata: &Metadata) -> String {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => "rwxr-xr-x".to_string(),
        (false, true) => "r--r--r--".to_string(),
        (false, false) => "rw-r--r--".to_string(),
    }
}

/// Formats one `ls -l` line. Entries older than six months, or dated in the
/// future, show the year instead of the time of day.
pub fn format_list_entry(name: &str, metadata: &Metadata, now: DateTime<Utc>) -> String {
    let kind = if metadata.is_dir() {
        'd'
    } else if metadata.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };

    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(now);
    let age = now.signed_duration_since(modified);
    let date = if age > Duration::days(180) || age < Duration::zero() {
        modified.format("%b %d  %Y")
    } else {
        modified.format("%b %d %H:%M")
    };

    format!(
        "{}{} 1 owner group {:>12} {} {}\r\n",
        kind,
        mode_string(metadata),
        metadata.len(),
        date,
        name
    )
}
