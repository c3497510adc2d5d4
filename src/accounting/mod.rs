mod hours;
mod locks;

pub use hours::{compute_hours, resolve_hours, validate_range};
pub use locks::UserLocks;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_record::{LeaveRecord, NewLeave};
use crate::model::profile::{Profile, ProfileDefaults, Weekday};
use crate::model::{LeaveId, UserId};
use crate::store::Store;

/// A leave request whose hours are fixed and which is waiting for the user
/// to accept an overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveProposal {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 38.0)]
    pub hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AddedLeave {
    pub record: LeaveRecord,
    #[schema(example = 269.5)]
    pub leave_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeleteAllOutcome {
    #[schema(example = 3)]
    pub removed: usize,
    #[schema(example = 76.0)]
    pub refunded_hours: f64,
    #[schema(example = 307.5)]
    pub leave_balance: f64,
}

pub fn validate_balance(new_balance: f64) -> AppResult<()> {
    if !new_balance.is_finite() || new_balance < 0.0 {
        return Err(AppError::Validation(
            "leave balance must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn check_sufficient(hours: f64, profile: &Profile) -> AppResult<()> {
    // equal to the remaining balance is allowed
    if hours > profile.leave_balance {
        return Err(AppError::InsufficientBalance {
            requested: hours,
            available: profile.leave_balance,
        });
    }
    Ok(())
}

/// Keeps the leave ledger and the balance consistent. Reads go straight to the
/// store; every mutation holds the user's lock for its whole read-modify-write.
pub struct Accounting {
    store: Arc<dyn Store>,
    defaults: ProfileDefaults,
    locks: UserLocks,
}

impl Accounting {
    pub fn new(store: Arc<dyn Store>, defaults: ProfileDefaults) -> Self {
        Self {
            store,
            defaults,
            locks: UserLocks::default(),
        }
    }

    /// Returns the stored profile, creating the default one on first access.
    pub async fn get_profile(&self, user_id: UserId) -> AppResult<Profile> {
        if let Some(profile) = self.store.find_profile(user_id).await? {
            return Ok(profile);
        }

        debug!(user_id, "Creating default profile");
        let profile = self
            .store
            .insert_profile_if_absent(&self.defaults.profile_for(user_id))
            .await?;
        Ok(profile)
    }

    pub async fn set_weekday_hours(
        &self,
        user_id: UserId,
        day: Weekday,
        hours: f64,
    ) -> AppResult<Profile> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::Validation(
                "hours must be a non-negative number".into(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;
        self.get_profile(user_id).await?;
        self.store.set_weekday_hours(user_id, day, hours).await?;

        info!(user_id, weekday = %day, hours, "Weekday hours updated");
        self.get_profile(user_id).await
    }

    /// Overwrites the balance. Confirmation is the caller's job.
    pub async fn set_balance(&self, user_id: UserId, new_balance: f64) -> AppResult<Profile> {
        validate_balance(new_balance)?;

        let _guard = self.locks.acquire(user_id).await;
        let previous = self.get_profile(user_id).await?.leave_balance;
        self.store.set_balance(user_id, new_balance).await?;

        info!(
            user_id,
            previous,
            new_balance,
            delta = new_balance - previous,
            "Leave balance overridden"
        );
        self.get_profile(user_id).await
    }

    /// Shifts the balance by `delta` and returns the new value.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn adjust_balance(&self, user_id: UserId, delta: f64) -> AppResult<f64> {
        if !delta.is_finite() {
            return Err(AppError::Validation("delta must be a finite number".into()));
        }

        let _guard = self.locks.acquire(user_id).await;
        self.get_profile(user_id).await?;
        Ok(self.store.adjust_balance(user_id, delta).await?)
    }

    /// All of the user's records, earliest start first.
    pub async fn list_leaves(&self, user_id: UserId) -> AppResult<Vec<LeaveRecord>> {
        let mut leaves = self.store.list_for_user(user_id).await?;
        leaves.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(leaves)
    }

    pub async fn preview_hours(
        &self,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<f64> {
        validate_range(start_date, end_date)?;
        let profile = self.get_profile(user_id).await?;
        Ok(compute_hours(&profile.weekday_hours, start_date, end_date))
    }

    /// Balance is a hard block. Overlap comes back as `OverlapDetected` carrying
    /// the proposal; nothing is written in either case.
    pub async fn add_leave(&self, user_id: UserId, request: LeaveRequest) -> AppResult<AddedLeave> {
        validate_range(request.start_date, request.end_date)?;

        let _guard = self.locks.acquire(user_id).await;
        let profile = self.get_profile(user_id).await?;
        let hours = resolve_hours(
            &profile.weekday_hours,
            request.start_date,
            request.end_date,
            request.hours_override,
        )?;

        check_sufficient(hours, &profile)?;

        if self
            .store
            .overlaps(user_id, request.start_date, request.end_date)
            .await?
        {
            debug!(user_id, hours, "Leave request overlaps an existing record");
            return Err(AppError::OverlapDetected(LeaveProposal {
                start_date: request.start_date,
                end_date: request.end_date,
                hours,
            }));
        }

        self.commit(user_id, request.start_date, request.end_date, hours)
            .await
    }

    /// Applies a proposal the user accepted despite the overlap. The balance
    /// is checked again, since it may have moved while the proposal was held.
    pub async fn confirm_leave(
        &self,
        user_id: UserId,
        proposal: LeaveProposal,
    ) -> AppResult<AddedLeave> {
        validate_range(proposal.start_date, proposal.end_date)?;
        if !proposal.hours.is_finite() || proposal.hours <= 0.0 {
            return Err(AppError::Validation("hours must be a positive number".into()));
        }

        let _guard = self.locks.acquire(user_id).await;
        let profile = self.get_profile(user_id).await?;
        check_sufficient(proposal.hours, &profile)?;

        self.commit(user_id, proposal.start_date, proposal.end_date, proposal.hours)
            .await
    }

    async fn commit(
        &self,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        hours: f64,
    ) -> AppResult<AddedLeave> {
        let (record, leave_balance) = self
            .store
            .insert_leave_and_debit(NewLeave {
                user_id,
                start_date,
                end_date,
                hours,
                requested_on: Utc::now(),
            })
            .await?;

        info!(user_id, leave_id = record.id, hours, leave_balance, "Leave added");
        Ok(AddedLeave {
            record,
            leave_balance,
        })
    }

    /// Looks up a record and checks it belongs to `user_id`.
    pub async fn find_own_leave(&self, user_id: UserId, leave_id: LeaveId) -> AppResult<LeaveRecord> {
        let record = self
            .store
            .find(leave_id)
            .await?
            .ok_or(AppError::NotFound("Leave record"))?;

        if record.user_id != user_id {
            return Err(AppError::NotOwner);
        }
        Ok(record)
    }

    /// Removes one record and refunds its hours. Returns the new balance.
    pub async fn delete_leave(&self, user_id: UserId, leave_id: LeaveId) -> AppResult<f64> {
        let _guard = self.locks.acquire(user_id).await;
        let record = self.find_own_leave(user_id, leave_id).await?;
        self.get_profile(user_id).await?;

        let leave_balance = self.store.delete_leave_and_credit(&record).await?;

        info!(user_id, leave_id, hours = record.hours, leave_balance, "Leave deleted");
        Ok(leave_balance)
    }

    pub async fn delete_all(&self, user_id: UserId) -> AppResult<DeleteAllOutcome> {
        let _guard = self.locks.acquire(user_id).await;
        self.get_profile(user_id).await?;

        let (removed, leave_balance) = self.store.delete_all_and_credit(user_id).await?;
        let refunded_hours: f64 = removed.iter().map(|l| l.hours).sum();

        info!(
            user_id,
            removed = removed.len(),
            refunded_hours,
            leave_balance,
            "All leave deleted"
        );
        Ok(DeleteAllOutcome {
            removed: removed.len(),
            refunded_hours,
            leave_balance,
        })
    }

    /// Drops the user, their profile and every record. No refund applies.
    pub async fn delete_account(&self, user_id: UserId) -> AppResult<()> {
        {
            let _guard = self.locks.acquire(user_id).await;
            self.store.delete_account(user_id).await?;
        }
        self.locks.forget(user_id);

        info!(user_id, "Account deleted");
        Ok(())
    }
}
