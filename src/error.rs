use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The course table record no longer exists or its expiry has passed.
    /// Terminal for that table id; the caller must create a new table.
    #[error("course table expired or no longer exists")]
    Expired,

    /// Recoverable failure talking to the course table service (network,
    /// validation, auth). Draft edits are preserved and the caller may retry.
    #[error("course table service error: {0}")]
    Service(String),

    #[error("a save is already in flight for this draft")]
    SaveInFlight,

    #[error("local storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// True for failures the user can retry without losing edits.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Service(_) | AppError::Storage(_))
    }
}
