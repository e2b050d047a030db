use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Databasfel: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO-fel: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON-fel: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Valideringsfel: {0}")]
    Validation(String),

    #[error("Hittades inte: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<rusqlite::Error>() {
            Ok(e) => Self::Database(e),
            Err(other) => Self::Other(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Fel från fjärrlagringen. Aldrig fatala, de rapporteras som händelse + `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Nätverksfel: {0}")]
    Network(String),

    #[error("Oväntat svar från servern: HTTP {0}")]
    Status(u16),

    #[error("Ogiltigt dokument: {0}")]
    Malformed(String),

    #[error("Lokal lagring: {0}")]
    Storage(String),
}

impl From<AppError> for SyncError {
    fn from(err: AppError) -> Self {
        Self::Storage(err.to_string())
    }
}
