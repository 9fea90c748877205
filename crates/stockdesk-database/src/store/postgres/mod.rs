//! PostgreSQL backend.
//!
//! Users, companies, and refresh sessions have their own tables. Tenant
//! documents share `tenant_records`, keyed by `(collection, id)`, with the
//! owning company in an indexed column next to the JSONB body.

mod accounts;
mod records;
mod sessions;

use stockdesk_core::error::{AppError, ErrorKind};

use crate::connection::DatabasePool;

/// All storage traits over one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabasePool,
}

impl PgStore {
    /// Create a store over an open pool.
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    fn pool(&self) -> &sqlx::PgPool {
        self.db.pool()
    }
}

/// Map a sqlx error, turning unique violations into `Conflict`.
fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if unique {
            AppError::with_source(ErrorKind::Conflict, format!("{context}: duplicate record"), e)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}
