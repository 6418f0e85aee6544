use std::{error::Error as StdError, fmt, io};

pub type Result<T> = ::std::result::Result<T, Error>;

pub enum Error {
    Spawn(String, io::Error),
    Mount(nix::Error),
    Io(io::Error),
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spawn(cmd, err) => write!(f, "Spawn error: couldn't launch '{}': {}", cmd, err),
            Error::Mount(err) => write!(f, "Mount error: couldn't mount /proc: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
