//! Account Entity
//!
//! In-memory representation of an account row. An `Account` value is a
//! snapshot: the balance it carries is only authoritative for the instant it
//! was read, so mutation code always re-reads the balance under a lock
//! instead of trusting a caller-held copy.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of generated account numbers
pub const ACCOUNT_NUMBER_RANGE: i64 = 10_000_000;

/// A persisted account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Internal identifier assigned by the store
    pub id: i64,

    pub first_name: String,

    pub last_name: String,

    /// argon2 PHC string, never sent over the wire
    #[serde(skip_serializing, default)]
    #[sqlx(rename = "password")]
    pub credential_hash: String,

    /// Externally-facing account number, unique
    pub number: i64,

    /// Balance in the smallest currency unit
    pub balance: i64,

    pub created_at: DateTime<Utc>,
}

/// An account that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub credential_hash: String,
    pub number: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Create a new account with a freshly generated number and zero balance
    pub fn new(first_name: String, last_name: String, credential_hash: String) -> Self {
        Self {
            first_name,
            last_name,
            credential_hash,
            number: generate_account_number(),
            created_at: Utc::now(),
        }
    }

    /// Override the generated account number
    pub fn with_number(mut self, number: i64) -> Self {
        self.number = number;
        self
    }

    /// Draw a new account number, used after a number collision
    pub fn regenerate_number(&mut self) {
        self.number = generate_account_number();
    }

    /// Build the stored form once the store has assigned an id
    pub fn into_account(self, id: i64) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            credential_hash: self.credential_hash,
            number: self.number,
            balance: 0,
            created_at: self.created_at,
        }
    }
}

fn generate_account_number() -> i64 {
    rand::thread_rng().gen_range(0..ACCOUNT_NUMBER_RANGE)
}
