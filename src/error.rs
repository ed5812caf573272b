//! Custom errors and results.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The kinds of errors that can happen when running `lithium`.
#[derive(Debug)]
pub enum Error {
    /// Invalid flags, a chunk bound that isn't a power of two, an unknown
    /// strategy, or a missing testcase. Terminates the process with exit
    /// code 2.
    Usage(String),

    /// The testcase file could not be opened or read.
    Unreadable(PathBuf, io::Error),

    /// The testcase's `DDBEGIN`/`DDEND` markers are malformed.
    InvalidMarkers(String),

    /// The unreduced testcase was not found interesting by the oracle.
    NotInteresting,

    /// The oracle adapter could not be loaded, or raised during a probe.
    OracleFault(String),

    /// A workspace directory could not be created after reasonable attempts.
    WorkspaceBusy(String),

    /// A lower-level IO error, not covered by a more specific variant.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Usage(ref s) => write!(f, "{}\nUse --help if you need it :)", s),
            Error::Unreadable(ref path, ref e) => {
                write!(f, "can't read the testcase file {}: {}", path.display(), e)
            }
            Error::InvalidMarkers(ref s) => write!(f, "{}", s),
            Error::NotInteresting => write!(f, "the original testcase is not 'interesting'!"),
            Error::OracleFault(ref s) => write!(f, "oracle error: {}", s),
            Error::WorkspaceBusy(ref s) => write!(f, "could not create a workspace: {}", s),
            Error::Io(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Unreadable(_, ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Exit code that `main` should use for a given error.
///
/// Usage errors exit 2, as specified; everything else that aborts the
/// process exits 1.
pub fn exit_code(e: &Error) -> i32 {
    match *e {
        Error::Usage(_) => 2,
        _ => 1,
    }
}

/// A `Result` whose `Err` variant is `lithium::error::Error`.
pub type Result<T> = ::std::result::Result<T, Error>;
