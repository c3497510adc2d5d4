mod memory;
mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

use crate::model::leave_record::{LeaveRecord, NewLeave};
use crate::model::profile::{Profile, Weekday};
use crate::model::user::User;
use crate::model::{LeaveId, UserId};

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
    #[display(fmt = "duplicate key")]
    Duplicate,
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row"),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                StoreError::Duplicate
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the username is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;
    async fn usernames(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError>;
    /// Writes `profile` unless the user already has one, then returns whatever is stored.
    /// Fails with `NotFound("user")` when the account does not exist.
    async fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile, StoreError>;
    async fn set_weekday_hours(
        &self,
        user_id: UserId,
        day: Weekday,
        hours: f64,
    ) -> Result<(), StoreError>;
    async fn set_balance(&self, user_id: UserId, balance: f64) -> Result<(), StoreError>;
    /// Returns the balance after applying `delta`.
    #[cfg_attr(not(test), allow(dead_code))]
    async fn adjust_balance(&self, user_id: UserId, delta: f64) -> Result<f64, StoreError>;
}

#[async_trait]
pub trait LeaveLedger: Send + Sync {
    /// Storage order, not presentation order.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError>;
    async fn find(&self, leave_id: LeaveId) -> Result<Option<LeaveRecord>, StoreError>;
    async fn overlaps(
        &self,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError>;
    // Single-table writes; the engine goes through the `Store` composites.
    #[cfg_attr(not(test), allow(dead_code))]
    async fn insert(&self, leave: NewLeave) -> Result<LeaveRecord, StoreError>;
    #[cfg_attr(not(test), allow(dead_code))]
    async fn delete(&self, leave_id: LeaveId) -> Result<(), StoreError>;
    #[cfg_attr(not(test), allow(dead_code))]
    async fn delete_all(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError>;
}

/// Ledger and balance mutations that land together or not at all.
#[async_trait]
pub trait Store: UserStore + ProfileStore + LeaveLedger {
    /// Returns the new record and the balance after the debit.
    async fn insert_leave_and_debit(
        &self,
        leave: NewLeave,
    ) -> Result<(LeaveRecord, f64), StoreError>;
    /// Returns the balance after the refund.
    async fn delete_leave_and_credit(&self, leave: &LeaveRecord) -> Result<f64, StoreError>;
    /// Refunds the total of every record held before deletion.
    async fn delete_all_and_credit(
        &self,
        user_id: UserId,
    ) -> Result<(Vec<LeaveRecord>, f64), StoreError>;
    async fn delete_account(&self, user_id: UserId) -> Result<(), StoreError>;
}
