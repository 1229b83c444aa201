pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Failed update of record {id} version {version}")]
    FailedUpdate { id: i64, version: i64 },

    #[error("Concurrent modification of item {id}, gave up after {attempts} attempts")]
    Conflict { id: i64, attempts: u32 },

    #[error("Invalid rating {value}, must be between 0 and {max}")]
    InvalidRating { value: f64, max: f64 },

    #[error("Operation timed out")]
    Timeout,

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Error::RecordNotFound(what.to_string())
    }
}
