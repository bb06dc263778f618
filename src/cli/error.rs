//! CLI error types and exit codes

use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Pipeline error
    #[error(transparent)]
    PipelineError(PipelineError),
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Config(e) => Self::ConfigurationError(e),
            other => Self::PipelineError(other),
        }
    }
}

impl CliError {
    /// Process exit status for this error
    ///
    /// 2 for configuration problems, 3 for authentication failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigurationError(_) => 2,
            Self::PipelineError(PipelineError::Authentication(_)) => 3,
            Self::PipelineError(_) => 1,
        }
    }
}
