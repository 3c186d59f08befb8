use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Fetch and load failures are not in here: those are absorbed where they
/// happen and show up as a shorter result set or a failed load report.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("input jobs must be a non-empty list of records")]
    EmptyBatch,

    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EtlError>;
