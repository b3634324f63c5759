//! Store errors

use thiserror::Error;

/// Errors that can occur while writing the inventory
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database URL could not be parsed or the pool could not be opened
    #[error("Failed to open database: {0}")]
    Connect(#[source] sqlx::Error),

    /// A table could not be created
    #[error("Failed to create table {table}: {source}")]
    Schema {
        /// Table being created
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Resource rows reference a cluster that was never recorded
    #[error("Cluster {0} has not been recorded")]
    MissingCluster(String),

    /// The database stopped answering (pool exhausted or closed, I/O or TLS failure)
    #[error("Database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// Any other database failure
    #[error("Database error: {0}")]
    Persistence(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether the database as a whole is unreachable, as opposed to one
    /// statement failing
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err),
            err => StoreError::Persistence(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_failures_are_unavailable() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_unavailable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(StoreError::from(sqlx::Error::Io(io)).is_unavailable());
    }

    #[test]
    fn test_statement_failures_are_persistence() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(!err.is_unavailable());
        assert!(!StoreError::MissingCluster("c1".to_string()).is_unavailable());
    }
}
