use thiserror::Error;

/// Failures surfaced by the data-access layer.
///
/// The layer performs no recovery: every error is returned to the caller
/// after the store has been restored to its pre-call state. `Storage`
/// carries an explicit `rolled_back` flag so callers can tell "a transaction
/// was open and has been rolled back" apart from "the failure happened with
/// no transaction open".
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no user matches the given criteria")]
    NotFound,

    #[error("invalid filter field: {0}")]
    InvalidFilter(String),

    #[error("invalid update field: {0}")]
    InvalidField(String),

    #[error("storage failure (rolled back: {rolled_back}): {source}")]
    Storage {
        #[source]
        source: sqlx::Error,
        rolled_back: bool,
    },
}

impl DbError {
    /// Storage failure with no transaction open (pool, connect, begin).
    pub(crate) fn storage(source: sqlx::Error) -> Self {
        DbError::Storage {
            source,
            rolled_back: false,
        }
    }

    /// Storage failure after an open transaction was rolled back.
    pub(crate) fn aborted(source: sqlx::Error) -> Self {
        DbError::Storage {
            source,
            rolled_back: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        assert_eq!(
            DbError::NotFound.to_string(),
            "no user matches the given criteria"
        );
    }

    #[test]
    fn invalid_field_names_the_offender() {
        let err = DbError::InvalidFilter("favorite_color".into());
        assert!(err.to_string().contains("favorite_color"));
    }

    #[test]
    fn storage_display_reports_rollback_state() {
        let err = DbError::aborted(sqlx::Error::PoolClosed);
        assert!(err.to_string().contains("rolled back: true"));

        let err = DbError::storage(sqlx::Error::PoolClosed);
        assert!(err.to_string().contains("rolled back: false"));
    }
}
