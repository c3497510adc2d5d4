use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{LeaveLedger, ProfileStore, Store, StoreError, UserStore};
use crate::model::leave_record::{LeaveRecord, NewLeave};
use crate::model::profile::{Profile, Weekday};
use crate::model::user::User;
use crate::model::{LeaveId, UserId};

#[derive(Default)]
struct Tables {
    next_user_id: UserId,
    next_leave_id: LeaveId,
    users: BTreeMap<UserId, User>,
    profiles: HashMap<UserId, Profile>,
    leaves: BTreeMap<LeaveId, LeaveRecord>,
}

impl Tables {
    fn profile_mut(&mut self, user_id: UserId) -> Result<&mut Profile, StoreError> {
        self.profiles
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("profile"))
    }

    fn insert_leave(&mut self, leave: NewLeave) -> LeaveRecord {
        self.next_leave_id += 1;
        let record = leave.into_record(self.next_leave_id);
        self.leaves.insert(record.id, record.clone());
        record
    }

    fn take_all_leaves(&mut self, user_id: UserId) -> Vec<LeaveRecord> {
        let ids: Vec<LeaveId> = self
            .leaves
            .values()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.leaves.remove(&id))
            .collect()
    }
}

/// Process-local store selected with `DATABASE_URL=memory://`. Every write runs
/// under one table lock, so composite mutations are all-or-nothing.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable`, like a dropped database link.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_link(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.check_link()?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.check_link()?;
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.username == username) {
            return Err(StoreError::Duplicate);
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password: password_hash.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let tables = self.read()?;
        Ok(tables.users.values().any(|u| u.username == username))
    }

    async fn usernames(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.read()?;
        Ok(tables.users.values().map(|u| u.username.clone()).collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        let tables = self.read()?;
        Ok(tables.profiles.get(&user_id).cloned())
    }

    async fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let mut tables = self.write()?;
        // same rule as the profiles -> users foreign key
        if !tables.users.contains_key(&profile.user_id) {
            return Err(StoreError::NotFound("user"));
        }
        Ok(tables
            .profiles
            .entry(profile.user_id)
            .or_insert_with(|| profile.clone())
            .clone())
    }

    async fn set_weekday_hours(
        &self,
        user_id: UserId,
        day: Weekday,
        hours: f64,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.profile_mut(user_id)?.weekday_hours.set(day, hours);
        Ok(())
    }

    async fn set_balance(&self, user_id: UserId, balance: f64) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.profile_mut(user_id)?.leave_balance = balance;
        Ok(())
    }

    async fn adjust_balance(&self, user_id: UserId, delta: f64) -> Result<f64, StoreError> {
        let mut tables = self.write()?;
        let profile = tables.profile_mut(user_id)?;
        profile.leave_balance += delta;
        Ok(profile.leave_balance)
    }
}

#[async_trait]
impl LeaveLedger for MemoryStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .leaves
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find(&self, leave_id: LeaveId) -> Result<Option<LeaveRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.leaves.get(&leave_id).cloned())
    }

    async fn overlaps(
        &self,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .leaves
            .values()
            .any(|l| l.user_id == user_id && l.overlaps(start_date, end_date)))
    }

    async fn insert(&self, leave: NewLeave) -> Result<LeaveRecord, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.insert_leave(leave))
    }

    async fn delete(&self, leave_id: LeaveId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables
            .leaves
            .remove(&leave_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("leave record"))
    }

    async fn delete_all(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.take_all_leaves(user_id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_leave_and_debit(
        &self,
        leave: NewLeave,
    ) -> Result<(LeaveRecord, f64), StoreError> {
        let mut tables = self.write()?;
        let hours = leave.hours;

        // check the profile before touching the ledger
        tables.profile_mut(leave.user_id)?;
        let record = tables.insert_leave(leave);
        let profile = tables.profile_mut(record.user_id)?;
        profile.leave_balance -= hours;

        Ok((record, profile.leave_balance))
    }

    async fn delete_leave_and_credit(&self, leave: &LeaveRecord) -> Result<f64, StoreError> {
        let mut tables = self.write()?;

        tables.profile_mut(leave.user_id)?;
        if tables.leaves.remove(&leave.id).is_none() {
            return Err(StoreError::NotFound("leave record"));
        }
        let profile = tables.profile_mut(leave.user_id)?;
        profile.leave_balance += leave.hours;

        Ok(profile.leave_balance)
    }

    async fn delete_all_and_credit(
        &self,
        user_id: UserId,
    ) -> Result<(Vec<LeaveRecord>, f64), StoreError> {
        let mut tables = self.write()?;

        tables.profile_mut(user_id)?;
        let removed = tables.take_all_leaves(user_id);
        let refund: f64 = removed.iter().map(|l| l.hours).sum();
        let profile = tables.profile_mut(user_id)?;
        profile.leave_balance += refund;
        let balance = profile.leave_balance;

        Ok((removed, balance))
    }

    async fn delete_account(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("user"));
        }

        tables.take_all_leaves(user_id);
        tables.profiles.remove(&user_id);
        tables.users.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::ProfileDefaults;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_leave(user_id: UserId, start: &str, end: &str, hours: f64) -> NewLeave {
        NewLeave {
            user_id,
            start_date: d(start),
            end_date: d(end),
            hours,
            requested_on: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user("ada", "hash").await.unwrap();
        assert!(matches!(
            store.insert_user("ada", "other").await,
            Err(StoreError::Duplicate)
        ));
        assert!(store.username_exists("ada").await.unwrap());
        assert!(!store.username_exists("grace").await.unwrap());
    }

    #[actix_web::test]
    async fn insert_profile_if_absent_keeps_first_write() {
        let store = MemoryStore::new();
        store.insert_user("ada", "hash").await.unwrap();
        let defaults = ProfileDefaults::default();
        let first = store.insert_profile_if_absent(&defaults.profile_for(1)).await.unwrap();

        let mut other = defaults.profile_for(1);
        other.leave_balance = 0.0;
        let second = store.insert_profile_if_absent(&other).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.leave_balance, defaults.leave_balance);
    }

    #[actix_web::test]
    async fn profile_needs_an_existing_account() {
        let store = MemoryStore::new();
        let result = store
            .insert_profile_if_absent(&ProfileDefaults::default().profile_for(5))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound("user"))));
        assert!(store.find_profile(5).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn ledger_delete_reports_missing_record() {
        let store = MemoryStore::new();
        let record = store.insert(new_leave(1, "2024-01-01", "2024-01-02", 8.0)).await.unwrap();

        store.delete(record.id).await.unwrap();
        assert!(matches!(
            store.delete(record.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn ledger_delete_all_only_touches_one_user() {
        let store = MemoryStore::new();
        store.insert(new_leave(1, "2024-01-01", "2024-01-02", 8.0)).await.unwrap();
        store.insert(new_leave(1, "2024-02-01", "2024-02-02", 8.0)).await.unwrap();
        store.insert(new_leave(2, "2024-01-01", "2024-01-02", 8.0)).await.unwrap();

        let removed = store.delete_all(1).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.list_for_user(1).await.unwrap().is_empty());
        assert_eq!(store.list_for_user(2).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn overlaps_is_scoped_to_user() {
        let store = MemoryStore::new();
        store.insert(new_leave(1, "2024-01-10", "2024-01-12", 8.0)).await.unwrap();

        assert!(store.overlaps(1, d("2024-01-12"), d("2024-01-15")).await.unwrap());
        assert!(!store.overlaps(2, d("2024-01-12"), d("2024-01-15")).await.unwrap());
        assert!(!store.overlaps(1, d("2024-01-13"), d("2024-01-15")).await.unwrap());
    }

    #[actix_web::test]
    async fn debit_without_profile_leaves_ledger_untouched() {
        let store = MemoryStore::new();
        let result = store
            .insert_leave_and_debit(new_leave(9, "2024-01-01", "2024-01-01", 8.0))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound("profile"))));
        assert!(store.list_for_user(9).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unavailable_link_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.find_profile(1).await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert!(store.find_profile(1).await.unwrap().is_none());
    }
}
