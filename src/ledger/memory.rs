//! In-process Ledger Store
//!
//! Committed account state lives behind one `RwLock` so a commit touching
//! several accounts becomes visible all at once. Mutation is serialized by a
//! per-account async mutex kept in a `DashMap`; a unit of work holds the
//! owned guards until it commits or is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{Account, NewAccount};

use super::{with_deadline, AccountKey, LedgerError, LedgerStore, LedgerTx};

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    numbers: HashMap<i64, i64>,
}

#[derive(Debug)]
struct Shared {
    tables: RwLock<Tables>,
    locks: DashMap<i64, Arc<Mutex<()>>>,
    next_id: AtomicI64,
}

impl Shared {
    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, LedgerError> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger tables poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, LedgerError> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger tables poisoned".to_string()))
    }

    /// Acquire the mutation lock of an account, waiting at most `deadline`
    async fn acquire(
        &self,
        id: i64,
        deadline: Duration,
    ) -> Result<OwnedMutexGuard<()>, LedgerError> {
        // Clone out of the map so no shard guard is held across the await
        let lock = self
            .locks
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))?;

        let guard = with_deadline(deadline, async move { Ok(lock.lock_owned().await) }).await?;

        // The account may have been deleted while we waited
        if !self.read()?.accounts.contains_key(&id) {
            return Err(LedgerError::NotFound(AccountKey::Id(id)));
        }

        Ok(guard)
    }
}

/// Ledger store kept in process memory
#[derive(Debug, Clone)]
pub struct InMemoryLedgerStore {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl InMemoryLedgerStore {
    /// Create an empty store whose lock waits honor `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                locks: DashMap::new(),
                next_id: AtomicI64::new(1),
            }),
            timeout,
        }
    }

    /// Sum of all balances, used to check conservation
    pub fn total_balance(&self) -> Result<i64, LedgerError> {
        Ok(self.shared.read()?.accounts.values().map(|a| a.balance).sum())
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: i64) -> Result<Account, LedgerError> {
        self.shared
            .read()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))
    }

    async fn get_by_number(&self, number: i64) -> Result<Account, LedgerError> {
        let tables = self.shared.read()?;
        tables
            .numbers
            .get(&number)
            .and_then(|id| tables.accounts.get(id))
            .cloned()
            .ok_or(LedgerError::NotFound(AccountKey::Number(number)))
    }

    async fn list(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.shared.read()?.accounts.values().cloned().collect())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, LedgerError> {
        let mut tables = self.shared.write()?;

        if tables.numbers.contains_key(&account.number) {
            return Err(LedgerError::Conflict(account.number));
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let account = account.into_account(id);

        self.shared.locks.insert(id, Arc::new(Mutex::new(())));
        tables.numbers.insert(account.number, id);
        tables.accounts.insert(id, account.clone());

        tracing::debug!(id, number = account.number, "Account stored");

        Ok(account)
    }

    async fn update_balance(&self, id: i64, new_balance: i64) -> Result<(), LedgerError> {
        let _guard = self.shared.acquire(id, self.timeout).await?;

        let mut tables = self.shared.write()?;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))?;
        account.balance = new_balance;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), LedgerError> {
        // Wait for any unit of work holding the account to finish
        let _guard = self.shared.acquire(id, self.timeout).await?;

        let mut tables = self.shared.write()?;
        let account = tables
            .accounts
            .remove(&id)
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))?;
        tables.numbers.remove(&account.number);
        self.shared.locks.remove(&id);

        tracing::debug!(id, number = account.number, "Account deleted");

        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        Ok(Box::new(InMemoryLedgerTx {
            shared: Arc::clone(&self.shared),
            timeout: self.timeout,
            held: HashMap::new(),
            finished: false,
        }))
    }
}

struct HeldAccount {
    _guard: OwnedMutexGuard<()>,
    balance: i64,
    staged: bool,
}

/// Unit of work over the in-process store
struct InMemoryLedgerTx {
    shared: Arc<Shared>,
    timeout: Duration,
    held: HashMap<i64, HeldAccount>,
    finished: bool,
}

impl InMemoryLedgerTx {
    fn held_mut(&mut self, id: i64) -> Result<&mut HeldAccount, LedgerError> {
        if self.finished {
            return Err(LedgerError::Finished);
        }
        self.held.get_mut(&id).ok_or(LedgerError::NotLocked(id))
    }
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn lock(&mut self, id: i64) -> Result<Account, LedgerError> {
        if self.finished {
            return Err(LedgerError::Finished);
        }

        if !self.held.contains_key(&id) {
            let guard = self.shared.acquire(id, self.timeout).await?;
            let balance = self.shared.get_balance(id)?;
            self.held.insert(
                id,
                HeldAccount {
                    _guard: guard,
                    balance,
                    staged: false,
                },
            );
        }

        let mut account = self
            .shared
            .read()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))?;
        account.balance = self.held_mut(id)?.balance;

        Ok(account)
    }

    async fn read_balance(&mut self, id: i64) -> Result<i64, LedgerError> {
        Ok(self.held_mut(id)?.balance)
    }

    async fn write_balance(&mut self, id: i64, new_balance: i64) -> Result<(), LedgerError> {
        let held = self.held_mut(id)?;
        held.balance = new_balance;
        held.staged = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        if self.finished {
            return Err(LedgerError::Finished);
        }

        {
            let mut tables = self.shared.write()?;

            // Validate every target before touching any of them
            for id in self.held.iter().filter(|(_, h)| h.staged).map(|(id, _)| id) {
                if !tables.accounts.contains_key(id) {
                    return Err(LedgerError::NotFound(AccountKey::Id(*id)));
                }
            }

            for (id, held) in self.held.iter().filter(|(_, h)| h.staged) {
                if let Some(account) = tables.accounts.get_mut(id) {
                    account.balance = held.balance;
                }
            }
        }

        self.finished = true;
        self.held.clear();
        Ok(())
    }
}

impl Shared {
    fn get_balance(&self, id: i64) -> Result<i64, LedgerError> {
        self.read()?
            .accounts
            .get(&id)
            .map(|account| account.balance)
            .ok_or(LedgerError::NotFound(AccountKey::Id(id)))
    }
}
