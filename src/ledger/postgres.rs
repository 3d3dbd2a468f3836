//! PostgreSQL Ledger Store
//!
//! Units of work map onto database transactions. Locking an account issues
//! `SELECT ... FOR UPDATE`, so the row lock is held until commit or rollback
//! and concurrent read-modify-write cycles on the same account serialize.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Account, NewAccount};

use super::{with_deadline, AccountKey, LedgerError, LedgerStore, LedgerTx};

/// Ledger store backed by the `account` table
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgLedgerStore {
    /// Create a store over a shared pool; every call honors `timeout`
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn map_insert_error(err: sqlx::Error, number: i64) -> LedgerError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => LedgerError::Conflict(number),
        other => LedgerError::Database(other),
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, id: i64) -> Result<Account, LedgerError> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Account>(
                r#"
                SELECT id, first_name, last_name, password, number, balance, created_at
                FROM account
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))
        })
        .await
    }

    async fn get_by_number(&self, number: i64) -> Result<Account, LedgerError> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Account>(
                r#"
                SELECT id, first_name, last_name, password, number, balance, created_at
                FROM account
                WHERE number = $1
                "#,
            )
            .bind(number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound(AccountKey::Number(number)))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Account>, LedgerError> {
        with_deadline(self.timeout, async {
            let accounts = sqlx::query_as::<_, Account>(
                r#"
                SELECT id, first_name, last_name, password, number, balance, created_at
                FROM account
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

            Ok(accounts)
        })
        .await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, LedgerError> {
        let number = account.number;

        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Account>(
                r#"
                INSERT INTO account (first_name, last_name, password, number, balance, created_at)
                VALUES ($1, $2, $3, $4, 0, $5)
                RETURNING id, first_name, last_name, password, number, balance, created_at
                "#,
            )
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.credential_hash)
            .bind(account.number)
            .bind(account.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, number))
        })
        .await
    }

    async fn update_balance(&self, id: i64, new_balance: i64) -> Result<(), LedgerError> {
        with_deadline(self.timeout, async {
            let rows_affected = sqlx::query("UPDATE account SET balance = $2 WHERE id = $1")
                .bind(id)
                .bind(new_balance)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows_affected == 0 {
                return Err(LedgerError::NotFound(AccountKey::Id(id)));
            }

            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), LedgerError> {
        with_deadline(self.timeout, async {
            let rows_affected = sqlx::query("DELETE FROM account WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if rows_affected == 0 {
                return Err(LedgerError::NotFound(AccountKey::Id(id)));
            }

            Ok(())
        })
        .await
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let tx = with_deadline(self.timeout, async { Ok(self.pool.begin().await?) }).await?;

        Ok(Box::new(PgLedgerTx {
            tx: Some(tx),
            locked: HashSet::new(),
            timeout: self.timeout,
        }))
    }
}

/// Unit of work backed by a database transaction
///
/// Dropping it without commit rolls the transaction back.
struct PgLedgerTx {
    tx: Option<Transaction<'static, Postgres>>,
    locked: HashSet<i64>,
    timeout: Duration,
}

impl PgLedgerTx {
    fn ensure_locked(&self, id: i64) -> Result<(), LedgerError> {
        if self.locked.contains(&id) {
            Ok(())
        } else {
            Err(LedgerError::NotLocked(id))
        }
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock(&mut self, id: i64) -> Result<Account, LedgerError> {
        let tx = self.tx.as_mut().ok_or(LedgerError::Finished)?;

        let account = with_deadline(self.timeout, async {
            sqlx::query_as::<_, Account>(
                r#"
                SELECT id, first_name, last_name, password, number, balance, created_at
                FROM account
                WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))
        })
        .await?;

        self.locked.insert(id);
        Ok(account)
    }

    async fn read_balance(&mut self, id: i64) -> Result<i64, LedgerError> {
        self.ensure_locked(id)?;
        let tx = self.tx.as_mut().ok_or(LedgerError::Finished)?;

        with_deadline(self.timeout, async {
            sqlx::query_scalar::<_, i64>("SELECT balance FROM account WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(LedgerError::NotFound(AccountKey::Id(id)))
        })
        .await
    }

    async fn write_balance(&mut self, id: i64, new_balance: i64) -> Result<(), LedgerError> {
        self.ensure_locked(id)?;
        let tx = self.tx.as_mut().ok_or(LedgerError::Finished)?;

        with_deadline(self.timeout, async {
            let rows_affected = sqlx::query("UPDATE account SET balance = $2 WHERE id = $1")
                .bind(id)
                .bind(new_balance)
                .execute(&mut **tx)
                .await?
                .rows_affected();

            if rows_affected == 0 {
                return Err(LedgerError::NotFound(AccountKey::Id(id)));
            }

            Ok(())
        })
        .await
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        let tx = self.tx.take().ok_or(LedgerError::Finished)?;
        self.locked.clear();

        with_deadline(self.timeout, async { Ok(tx.commit().await?) }).await
    }
}
