use std::fmt;

/// Result alias used throughout the engine.
pub type CResult<T> = std::result::Result<T, Error>;

/// Errors the core engine can surface to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request line could not be parsed into a command.
    Parse(String),

    /// A verb that parsed fine but names no known operation.
    UnknownCommand(String),

    /// An operation named a `tid` that does not name a live transaction.
    UnknownTransaction(u64),

    /// A `WRITE` lock was requested on a key currently `READ`-held by
    /// some other transaction.
    LockUpgradeDenied(String),

    /// Anything else internal to the engine that doesn't fit the above.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(msg) => write!(f, "{}", msg),
            Error::UnknownCommand(_) => write!(f, "Unknown command"),
            Error::UnknownTransaction(tid) => write!(f, "Invalid transaction ID {}", tid),
            Error::LockUpgradeDenied(key) => {
                write!(f, "cannot upgrade lock on key \"{}\": held for read by another transaction", key)
            }
            Error::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
