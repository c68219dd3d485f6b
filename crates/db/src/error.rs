//! Mapping of database errors into ledger errors.

use sea_orm::{DbErr, RuntimeErr};

use bledger_core::ledger::LedgerError;

/// Postgres SQLSTATE for `lock_not_available`, raised when `lock_timeout`
/// expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Converts a `DbErr` into a `LedgerError`.
///
/// A lock wait that hit `lock_timeout` becomes the retryable
/// `LedgerError::LockTimeout`; everything else is `Database`.
pub fn db_error(err: DbErr) -> LedgerError {
    if sqlstate(&err).as_deref() == Some(LOCK_NOT_AVAILABLE) {
        tracing::warn!(error = %err, "Row lock wait timed out");
        return LedgerError::LockTimeout;
    }
    tracing::error!(error = %err, "Database error");
    LedgerError::Database(err.to_string())
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            e.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_errors_map_to_database() {
        let err = db_error(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, LedgerError::Database(ref msg) if msg.contains("boom")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_record_not_found_is_database() {
        let err = db_error(DbErr::RecordNotFound("accounts".to_string()));
        assert!(matches!(err, LedgerError::Database(_)));
    }
}
