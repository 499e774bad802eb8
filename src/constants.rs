// src/constants.rs

use std::time::Duration;

pub const SERVER_BANNER: &str = "fixtureftpd ready.";
pub const MAX_COMMAND_LINE_LENGTH: usize = 4096;
pub const DATA_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const TRANSFER_BUFFER_SIZE: usize = 64 * 1024;
