use thiserror::Error;

/// Every failure the dashboard can surface.
///
/// Each variant maps to a process exit code (see [`AppError::exit_code`]) so the
/// binary can report failures the same way regardless of which command ran.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// The input file is missing, unreadable, or malformed.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A view asked for a column that does not exist or cannot play the
    /// requested role (key vs value).
    #[error("Invalid group key `{column}`: {reason}")]
    InvalidGroupKey { column: String, reason: String },

    /// The aggregated view has nothing to draw.
    #[error("No data to display for `{view}`.")]
    EmptyView { view: String },

    /// Terminal setup, drawing, or event handling failed.
    #[error("{0}")]
    Terminal(String),

    /// Writing an export artifact failed.
    #[error("{0}")]
    Export(String),
}

impl AppError {
    pub fn data(message: impl Into<String>) -> Self {
        Self::DataUnavailable(message.into())
    }

    pub fn invalid_key(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGroupKey {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal(message.into())
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::DataUnavailable(_) | AppError::Export(_) => 2,
            AppError::InvalidGroupKey { .. } | AppError::EmptyView { .. } => 3,
            AppError::Terminal(_) => 4,
        }
    }

    /// `EmptyView` is the only failure a panel can recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::EmptyView { .. })
    }
}
