use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    NOOP,
    SYST,
    FEAT,
    OPTS,
    TYPE,
    PWD,
    CWD,
    CDUP,
    LIST,
    NLST,
    RETR,
    STOR,
    APPE,
    DELE,
    MKD,
    RMD,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    PASV,
    EPSV,
    PORT,
    AUTH,
    PBSZ,
    PROT,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "NOOP" => Some(FtpCommand::NOOP),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "TYPE" => Some(FtpCommand::TYPE),
            "PWD" | "XPWD" => Some(FtpCommand::PWD),
            "CWD" | "XCWD" => Some(FtpCommand::CWD),
            "CDUP" | "XCUP" => Some(FtpCommand::CDUP),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "DELE" => Some(FtpCommand::DELE),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            "PORT" => Some(FtpCommand::PORT),
            "AUTH" => Some(FtpCommand::AUTH),
            "PBSZ" => Some(FtpCommand::PBSZ),
            "PROT" => Some(FtpCommand::PROT),
            _ => None,
        }
    }

    /// Commands that may be issued before logging in.
    pub fn requires_login(self) -> bool {
        !matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::NOOP
                | FtpCommand::SYST
                | FtpCommand::FEAT
                | FtpCommand::OPTS
                | FtpCommand::AUTH
                | FtpCommand::PBSZ
                | FtpCommand::PROT
        )
    }

    pub fn required_permission(self) -> Option<Permission> {
        match self {
            FtpCommand::CWD | FtpCommand::CDUP => Some(Permission::ChangeDir),
            FtpCommand::LIST | FtpCommand::NLST | FtpCommand::SIZE | FtpCommand::MDTM => {
                Some(Permission::List)
            }
            FtpCommand::RETR => Some(Permission::Retrieve),
            FtpCommand::STOR => Some(Permission::Store),
            FtpCommand::APPE => Some(Permission::Append),
            FtpCommand::DELE | FtpCommand::RMD => Some(Permission::Delete),
            FtpCommand::MKD => Some(Permission::MakeDir),
            FtpCommand::RNFR | FtpCommand::RNTO => Some(Permission::Rename),
            _ => None,
        }
    }
}

/// Splits a raw control line into its command and argument.
///
/// The argument is everything after the first space, so file names may
/// contain spaces.
pub fn parse_command_line(line: &str) -> Result<(FtpCommand, String), CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));

    if verb.is_empty() || verb.len() > 4 || !verb.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CommandError::Syntax(
            "Syntax error: command unrecognized.".to_string(),
        ));
    }

    let command = FtpCommand::from_str(verb)
        .ok_or_else(|| CommandError::UnknownCommand(verb.to_ascii_uppercase()))?;
    Ok((command, arg.to_string()))
}
