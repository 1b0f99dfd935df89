/// Coarse classification used for diagnostics and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Allocation,
    Communication,
}

#[derive(Debug)]
pub enum Error {
    InvalidParameters(String),
    InvalidDomain {
        np: usize,
        dims: Vec<usize>,
        msg: String,
    },
    Allocation {
        bytes: usize,
    },
    Communication {
        rank: usize,
        msg: String,
    },
    MpiError {
        code: i32,
        msg: String,
    },
    Io(std::io::Error),
}

impl Error {
    pub fn invalid_parameters(msg: &str) -> Self {
        Error::InvalidParameters(msg.to_string())
    }

    pub fn invalid_domain(np: usize, dims: Vec<usize>, msg: &str) -> Self {
        Error::InvalidDomain {
            np,
            dims,
            msg: msg.to_string(),
        }
    }

    pub fn allocation(bytes: usize) -> Self {
        Error::Allocation { bytes }
    }

    pub fn communication(rank: usize, msg: &str) -> Self {
        Error::Communication {
            rank,
            msg: msg.to_string(),
        }
    }

    pub fn mpi_error(code: i32, msg: &str) -> Self {
        Error::MpiError {
            code,
            msg: msg.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameters(_) | Error::InvalidDomain { .. } => ErrorKind::Config,
            Error::Allocation { .. } => ErrorKind::Allocation,
            Error::Communication { .. } | Error::MpiError { .. } | Error::Io(_) => {
                ErrorKind::Communication
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Config => 2,
            ErrorKind::Allocation => 3,
            ErrorKind::Communication => 1,
        }
    }

    /// True for errors that only report a peer going away, as opposed to the
    /// failure that made it go away.
    pub fn is_peer_failure(&self) -> bool {
        matches!(self, Error::Communication { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            Error::InvalidDomain { np, dims, msg } => {
                write!(f, "Invalid domain (np={}, dims={:?}): {}", np, dims, msg)
            }
            Error::Allocation { bytes } => {
                write!(f, "Allocation failed: could not reserve {} bytes", bytes)
            }
            Error::Communication { rank, msg } => {
                write!(f, "Communication error on rank {}: {}", rank, msg)
            }
            Error::MpiError { code, msg } => write!(f, "MPI error: ({}) {}", code, msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
