use tycho_types::models::StdAddr;

/// Routing or query result.
pub type PipeResult<T, E = PipeError> = ::core::result::Result<T, E>;

/// Routing or query error.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("target {0} not found in registry")]
    NotFound(StdAddr),
    #[error("target {0} is not a contract")]
    NotAContract(StdAddr),
    #[error("contract {address} failed with exit code {exit_code}")]
    Rejected { address: StdAddr, exit_code: i32 },
    #[error("hop limit exceeded ({limit} deliveries)")]
    HopLimitExceeded { limit: usize },
    #[error("fatal error")]
    Fatal(#[from] anyhow::Error),
}

impl PipeError {
    /// Exit code of a rejected message or getter call.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Rejected { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

impl From<tycho_types::error::Error> for PipeError {
    #[inline]
    fn from(value: tycho_types::error::Error) -> Self {
        Self::Fatal(anyhow::Error::from(value))
    }
}
