use crate::core_auth::error::AuthError;
use std::collections::BTreeSet;
use std::fmt;

/// One operation a user may be allowed to perform.
///
/// Each operation is written as one letter in a permission string such as
/// `elradfmw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// `e`: change directory (CWD, CDUP)
    ChangeDir,
    /// `l`: list files (LIST, NLST, SIZE, MDTM)
    List,
    /// `r`: retrieve a file (RETR)
    Retrieve,
    /// `a`: append to a file (APPE)
    Append,
    /// `d`: delete a file or directory (DELE, RMD)
    Delete,
    /// `f`: rename (RNFR, RNTO)
    Rename,
    /// `m`: create a directory (MKD)
    MakeDir,
    /// `w`: store a file (STOR)
    Store,
    /// `M`: change file mode
    ChangeMode,
    /// `T`: change file modification time
    ChangeTime,
}

impl Permission {
    pub fn from_symbol(symbol: char) -> Result<Self, AuthError> {
        match symbol {
            'e' => Ok(Permission::ChangeDir),
            'l' => Ok(Permission::List),
            'r' => Ok(Permission::Retrieve),
            'a' => Ok(Permission::Append),
            'd' => Ok(Permission::Delete),
            'f' => Ok(Permission::Rename),
            'm' => Ok(Permission::MakeDir),
            'w' => Ok(Permission::Store),
            'M' => Ok(Permission::ChangeMode),
            'T' => Ok(Permission::ChangeTime),
            other => Err(AuthError::InvalidPermission(other)),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Permission::ChangeDir => 'e',
            Permission::List => 'l',
            Permission::Retrieve => 'r',
            Permission::Append => 'a',
            Permission::Delete => 'd',
            Permission::Rename => 'f',
            Permission::MakeDir => 'm',
            Permission::Store => 'w',
            Permission::ChangeMode => 'M',
            Permission::ChangeTime => 'T',
        }
    }
}

/// A parsed permission string such as `"elr"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(BTreeSet<Permission>);

impl Permissions {
    pub fn parse(perm: &str) -> Result<Self, AuthError> {
        perm.chars()
            .map(Permission::from_symbol)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Permissions)
    }

    pub fn has(&self, perm: Permission) -> bool {
        self.0.contains(&perm)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for perm in &self.0 {
            write!(f, "{}", perm.symbol())?;
        }
        Ok(())
    }
}
