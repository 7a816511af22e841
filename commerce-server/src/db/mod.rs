//! Database Module
//!
//! Handles the SQLite connection pool and migrations

pub mod models;
pub mod repository;

use std::str::FromStr;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::utils::AppError;

/// Database service — owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Create a new database service with WAL mode enabled
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        // Build connection options: WAL, foreign keys, normal sync
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON")
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        // busy_timeout: 写冲突时等待 5s 而非立即失败
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

        tracing::info!("Database connection established (SQLite WAL, busy_timeout=5000ms)");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Check out a plain pooled connection (reads and single-statement writes)
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Begin a write transaction that takes the SQLite write lock up front.
    ///
    /// `BEGIN IMMEDIATE` serializes writers at transaction start, so a
    /// read-compute-write sequence inside the transaction cannot lose an
    /// update to a concurrent writer. Waiters queue on `busy_timeout`.
    pub async fn begin_immediate(&self) -> Result<ImmediateTransaction, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(ImmediateTransaction {
            conn: Some(conn),
            finished: false,
        })
    }
}

/// An explicit `BEGIN IMMEDIATE` transaction on a pooled connection.
///
/// Must be ended with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback); if dropped mid-transaction the
/// connection is detached from the pool instead of being returned with
/// an open transaction.
pub struct ImmediateTransaction {
    conn: Option<PoolConnection<Sqlite>>,
    finished: bool,
}

impl ImmediateTransaction {
    /// The underlying connection, for executing statements inside the transaction
    pub fn conn(&mut self) -> &mut SqliteConnection {
        // conn is only None after commit/rollback consumed self
        self.conn.as_mut().expect("transaction already finished")
    }

    pub async fn commit(mut self) -> Result<(), sqlx::Error> {
        if let Some(mut conn) = self.conn.take() {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
        }
        self.finished = true;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), sqlx::Error> {
        if let Some(mut conn) = self.conn.take() {
            sqlx::query("ROLLBACK").execute(&mut *conn).await?;
        }
        self.finished = true;
        Ok(())
    }
}

impl Drop for ImmediateTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take()
            && !self.finished
        {
            // Do not return a connection with an open transaction to the pool
            tracing::warn!("ImmediateTransaction dropped without commit/rollback; detaching connection");
            drop(conn.detach());
        }
    }
}
