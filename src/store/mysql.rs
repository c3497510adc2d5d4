use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, MySqlConnection, MySqlPool};

use super::{LeaveLedger, ProfileStore, Store, StoreError, UserStore};
use crate::model::leave_record::{LeaveRecord, NewLeave};
use crate::model::profile::{Profile, Weekday, WeekdayHours};
use crate::model::user::User;
use crate::model::{LeaveId, UserId};

const LEAVE_COLUMNS: &str = "id, user_id, start_date, end_date, hours, requested_on";

#[derive(FromRow)]
struct ProfileRow {
    user_id: u64,
    mon_hours: f64,
    tue_hours: f64,
    wed_hours: f64,
    thu_hours: f64,
    fri_hours: f64,
    sat_hours: f64,
    sun_hours: f64,
    leave_balance: f64,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            weekday_hours: WeekdayHours {
                mon: row.mon_hours,
                tue: row.tue_hours,
                wed: row.wed_hours,
                thu: row.thu_hours,
                fri: row.fri_hours,
                sat: row.sat_hours,
                sun: row.sun_hours,
            },
            leave_balance: row.leave_balance,
        }
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/* =========================
Connection-level helpers, shared by single statements and transactions
========================= */

async fn fetch_profile(
    conn: &mut MySqlConnection,
    user_id: UserId,
) -> Result<Option<Profile>, StoreError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT user_id, mon_hours, tue_hours, wed_hours, thu_hours,
               fri_hours, sat_hours, sun_hours, leave_balance
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Profile::from))
}

/// Locks the profile row for the rest of the transaction and shifts its balance.
async fn shift_balance(
    conn: &mut MySqlConnection,
    user_id: UserId,
    delta: f64,
) -> Result<f64, StoreError> {
    let current: Option<f64> =
        sqlx::query_scalar("SELECT leave_balance FROM profiles WHERE user_id = ? FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    let next = current.ok_or(StoreError::NotFound("profile"))? + delta;

    sqlx::query("UPDATE profiles SET leave_balance = ? WHERE user_id = ?")
        .bind(next)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(next)
}

async fn insert_leave_row(
    conn: &mut MySqlConnection,
    leave: NewLeave,
) -> Result<LeaveRecord, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO leaves (user_id, start_date, end_date, hours, requested_on)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(leave.user_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.hours)
    .bind(leave.requested_on)
    .execute(&mut *conn)
    .await?;

    Ok(leave.into_record(result.last_insert_id()))
}

async fn delete_leave_row(conn: &mut MySqlConnection, leave_id: LeaveId) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM leaves WHERE id = ?")
        .bind(leave_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("leave record"));
    }
    Ok(())
}

async fn take_all_leaves(
    conn: &mut MySqlConnection,
    user_id: UserId,
) -> Result<Vec<LeaveRecord>, StoreError> {
    let removed = sqlx::query_as::<_, LeaveRecord>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leaves WHERE user_id = ? FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM leaves WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(removed)
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        let result = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_id())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn usernames(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>("SELECT username FROM users")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}

#[async_trait]
impl ProfileStore for MySqlStore {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_profile(&mut conn, user_id).await
    }

    async fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let hours = &profile.weekday_hours;

        // INSERT IGNORE keeps concurrent first reads from producing two rows
        sqlx::query(
            r#"
            INSERT IGNORE INTO profiles
                (user_id, mon_hours, tue_hours, wed_hours, thu_hours,
                 fri_hours, sat_hours, sun_hours, leave_balance)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.user_id)
        .bind(hours.mon)
        .bind(hours.tue)
        .bind(hours.wed)
        .bind(hours.thu)
        .bind(hours.fri)
        .bind(hours.sat)
        .bind(hours.sun)
        .bind(profile.leave_balance)
        .execute(&mut *conn)
        .await?;

        // INSERT IGNORE also swallows the foreign key error of a missing user
        fetch_profile(&mut conn, profile.user_id)
            .await?
            .ok_or(StoreError::NotFound("user"))
    }

    async fn set_weekday_hours(
        &self,
        user_id: UserId,
        day: Weekday,
        hours: f64,
    ) -> Result<(), StoreError> {
        // column name comes from a closed enum, never from input
        let sql = format!("UPDATE profiles SET {} = ? WHERE user_id = ?", day.column());
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(&sql)
            .bind(hours)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 && fetch_profile(&mut conn, user_id).await?.is_none() {
            return Err(StoreError::NotFound("profile"));
        }
        Ok(())
    }

    async fn set_balance(&self, user_id: UserId, balance: f64) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query("UPDATE profiles SET leave_balance = ? WHERE user_id = ?")
            .bind(balance)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 && fetch_profile(&mut conn, user_id).await?.is_none() {
            return Err(StoreError::NotFound("profile"));
        }
        Ok(())
    }

    async fn adjust_balance(&self, user_id: UserId, delta: f64) -> Result<f64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let balance = shift_balance(&mut tx, user_id, delta).await?;
        tx.commit().await?;
        Ok(balance)
    }
}

#[async_trait]
impl LeaveLedger for MySqlStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError> {
        let leaves = sqlx::query_as::<_, LeaveRecord>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leaves)
    }

    async fn find(&self, leave_id: LeaveId) -> Result<Option<LeaveRecord>, StoreError> {
        let leave = sqlx::query_as::<_, LeaveRecord>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ?"
        ))
        .bind(leave_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(leave)
    }

    async fn overlaps(
        &self,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let overlaps = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leaves
                WHERE user_id = ?
                AND start_date <= ?
                AND end_date >= ?
            )
            "#,
        )
        .bind(user_id)
        .bind(end_date)
        .bind(start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(overlaps)
    }

    async fn insert(&self, leave: NewLeave) -> Result<LeaveRecord, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_leave_row(&mut conn, leave).await
    }

    async fn delete(&self, leave_id: LeaveId) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        delete_leave_row(&mut conn, leave_id).await
    }

    async fn delete_all(&self, user_id: UserId) -> Result<Vec<LeaveRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let removed = take_all_leaves(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn insert_leave_and_debit(
        &self,
        leave: NewLeave,
    ) -> Result<(LeaveRecord, f64), StoreError> {
        let mut tx = self.pool.begin().await?;
        let user_id = leave.user_id;
        let hours = leave.hours;

        let balance = shift_balance(&mut tx, user_id, -hours).await?;
        let record = insert_leave_row(&mut tx, leave).await?;

        tx.commit().await?;
        Ok((record, balance))
    }

    async fn delete_leave_and_credit(&self, leave: &LeaveRecord) -> Result<f64, StoreError> {
        let mut tx = self.pool.begin().await?;

        delete_leave_row(&mut tx, leave.id).await?;
        let balance = shift_balance(&mut tx, leave.user_id, leave.hours).await?;

        tx.commit().await?;
        Ok(balance)
    }

    async fn delete_all_and_credit(
        &self,
        user_id: UserId,
    ) -> Result<(Vec<LeaveRecord>, f64), StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = take_all_leaves(&mut tx, user_id).await?;
        let refund: f64 = removed.iter().map(|l| l.hours).sum();
        let balance = shift_balance(&mut tx, user_id, refund).await?;

        tx.commit().await?;
        Ok((removed, balance))
    }

    async fn delete_account(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM leaves WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // dropping the transaction rolls back
            return Err(StoreError::NotFound("user"));
        }

        tx.commit().await?;
        Ok(())
    }
}
