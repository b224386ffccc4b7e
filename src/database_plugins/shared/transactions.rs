// ABOUTME: Transaction management with an RAII guard for multi-statement registry writes.
// ABOUTME: Rolls back automatically on drop for both PostgreSQL and SQLite.

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Transaction management with RAII guards
//!
//! `TransactionGuard` wraps an sqlx `Transaction`:
//! - Automatic rollback if the guard is dropped without calling `commit()`
//! - Commit and rollback consume the guard
//! - Works with both SQLite and PostgreSQL via sqlx generics
//!
//! ## Example Usage
//!
//! ```text
//! let tx = pool.begin().await?;
//! let mut guard = TransactionGuard::new(tx);
//!
//! sqlx::query("DELETE FROM chart_info WHERE datasource_id = ?")
//!     .bind(&id)
//!     .execute(guard.executor()?)
//!     .await?;
//! sqlx::query("DELETE FROM datasource WHERE id = ?")
//!     .bind(&id)
//!     .execute(guard.executor()?)
//!     .await?;
//!
//! guard.commit().await?;
//! ```

use sqlx::{Database, Transaction};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// RAII guard for database transactions ensuring rollback on drop
///
/// If the owning future is cancelled or an error short-circuits before
/// `commit()`, the guard is dropped and sqlx rolls the transaction back.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Wrap a transaction obtained from `pool.begin().await`
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        debug!("TransactionGuard created");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.commit().await.map_err(|e| {
                    AppError::database("Transaction commit failed").with_source(e)
                })?;
                self.committed = true;
                debug!("TransactionGuard committed");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot commit",
            )),
        }
    }

    /// Roll the transaction back explicitly and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the rollback fails
    pub async fn rollback(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.rollback().await.map_err(|e| {
                    AppError::database("Transaction rollback failed").with_source(e)
                })?;
                debug!("TransactionGuard rolled back explicitly");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot rollback",
            )),
        }
    }

    /// Check if the transaction has been committed
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Connection to execute statements on inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the guard has already been consumed
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            warn!("TransactionGuard dropped without commit - transaction will be rolled back");
        }
    }
}

/// `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, sqlx::Sqlite>;

/// `PostgreSQL` transaction guard
pub type PostgresTransactionGuard<'c> = TransactionGuard<'c, sqlx::Postgres>;
