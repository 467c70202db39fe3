#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report with id {id} not found")]
    NotFound { id: String },
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    Validation(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read snapshot file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write snapshot file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize snapshot: {0}")]
    Deserialization(serde_json::Error),
}

impl ReportError {
    /// Stable machine-readable code for this error, suitable for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::NotFound { .. } => "REPORT_NOT_FOUND",
            ReportError::InvalidParameter(_) => "INVALID_PARAMETER",
            ReportError::Validation(_) => "VALIDATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        ReportError::NotFound { id: id.into() }
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
