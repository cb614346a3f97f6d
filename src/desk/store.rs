use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use std::collections::BTreeMap;

/// Messenger user identifier; also the payload of a customer's marker
pub type UserId = i64;

/// Registered customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Messenger id
    pub id: UserId,
    /// Messenger handle, when the user has one
    pub username: Option<String>,
    /// Full name, at least two words
    pub full_name: String,
    /// Date of birth
    pub birth_date: NaiveDate,
    /// Normalized phone number (`+7` and ten digits)
    pub phone: String,
    /// Local time of registration
    pub registered_at: NaiveDateTime,
}

/// Prepaid minutes of one customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    /// Minutes left to spend
    pub remaining: u32,
    /// Minutes spent so far
    pub total_used: u32,
}

/// Storage failures surfaced to the conversation layer
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No such user
    #[error("user {0} is not registered")]
    UnknownUser(UserId),
    /// The id is taken
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),
    /// Debit larger than the remaining balance
    #[error("insufficient minutes: {available} available, {requested} requested")]
    InsufficientMinutes {
        /// Minutes left
        available: u32,
        /// Minutes asked for
        requested: u32,
    },
}

/// Persistence behind the front desk
pub trait SalonStore {
    /// Whether `id` is registered
    fn user_exists(&self, id: UserId) -> bool;

    /// Look up a registered user
    fn user(&self, id: UserId) -> Option<UserRecord>;

    /// Register a new user with an empty balance
    fn create_user(&mut self, record: UserRecord) -> Result<(), StoreError>;

    /// Current balance of a registered user
    fn balance(&self, id: UserId) -> Result<Balance, StoreError>;

    /// Add (`delta > 0`) or spend (`delta < 0`) minutes.
    ///
    /// Spending requires `remaining >= |delta|` and moves the minutes into `total_used`.
    fn adjust_balance(&mut self, id: UserId, delta_minutes: i64) -> Result<Balance, StoreError>;

    /// Queue `text` for every registered user; returns the number of recipients
    fn broadcast(&mut self, text: &str) -> usize;
}

/// In-memory store; broadcasts accumulate in an outbox
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, (UserRecord, Balance)>,
    outbox: Vec<(UserId, String)>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages queued by [`SalonStore::broadcast`], oldest first
    pub fn outbox(&self) -> &[(UserId, String)] {
        &self.outbox
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True when nobody is registered
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl SalonStore for MemoryStore {
    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    fn user(&self, id: UserId) -> Option<UserRecord> {
        self.users.get(&id).map(|(record, _)| record.clone())
    }

    fn create_user(&mut self, record: UserRecord) -> Result<(), StoreError> {
        if self.users.contains_key(&record.id) {
            return Err(StoreError::AlreadyRegistered(record.id));
        }
        info!("registered user {}", record.id);
        self.users.insert(record.id, (record, Balance::default()));
        Ok(())
    }

    fn balance(&self, id: UserId) -> Result<Balance, StoreError> {
        self.users
            .get(&id)
            .map(|(_, balance)| *balance)
            .ok_or(StoreError::UnknownUser(id))
    }

    fn adjust_balance(&mut self, id: UserId, delta_minutes: i64) -> Result<Balance, StoreError> {
        let (_, balance) = self.users.get_mut(&id).ok_or(StoreError::UnknownUser(id))?;
        let amount = u32::try_from(delta_minutes.unsigned_abs()).unwrap_or(u32::MAX);

        if delta_minutes >= 0 {
            balance.remaining = balance.remaining.saturating_add(amount);
        } else {
            if balance.remaining < amount {
                return Err(StoreError::InsufficientMinutes {
                    available: balance.remaining,
                    requested: amount,
                });
            }
            balance.remaining -= amount;
            balance.total_used = balance.total_used.saturating_add(amount);
        }

        info!(
            "balance of {id}: {delta_minutes:+} -> {} remaining, {} used",
            balance.remaining, balance.total_used
        );
        Ok(*balance)
    }

    fn broadcast(&mut self, text: &str) -> usize {
        let recipients: Vec<UserId> = self.users.keys().copied().collect();
        for id in &recipients {
            self.outbox.push((*id, text.to_string()));
        }
        info!("broadcast queued for {} users", recipients.len());
        recipients.len()
    }
}
