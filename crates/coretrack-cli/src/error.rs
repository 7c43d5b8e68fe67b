use coretrack_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("snapshot file error: {0}")]
    Snapshots(String),

    #[error("output write error: {0}")]
    Output(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Snapshots(_) => 2,
            Self::Output(_) => 1,
        }
    }
}
